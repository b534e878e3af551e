//! Export rendered prompts without calling a backend

use crate::error::Result;
use crate::prompt::build_prompt;
use crate::writer::JsonlWriter;
use payqa_domain::{ControlSet, Exemplar, Record};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{error, info};

/// One exported prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptLine {
    /// Record the prompt was rendered for
    pub record_id: String,
    /// Full prompt text
    pub prompt: String,
}

/// Outcome of an export run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    /// Prompts written
    pub written: usize,
    /// Records skipped because their prompt could not be rendered
    pub skipped: usize,
}

/// Render every record's prompt and write it as one JSONL line
///
/// A record whose prompt cannot be rendered is logged and skipped; write
/// failures abort the export.
pub fn export_prompts<W: Write + Send>(
    records: &[Record],
    questions: &[String],
    controls: &ControlSet,
    exemplars: &[Exemplar],
    out: &JsonlWriter<W>,
) -> Result<ExportStats> {
    let mut stats = ExportStats::default();

    for (idx, record) in records.iter().enumerate() {
        match build_prompt(record, controls, questions, exemplars) {
            Ok(prompt) => {
                out.write_line(&PromptLine {
                    record_id: record.id().to_string(),
                    prompt,
                })?;
                stats.written += 1;
            }
            Err(e) => {
                error!(
                    "Error building prompt {}/{} ({}): {}",
                    idx + 1,
                    records.len(),
                    record.id(),
                    e
                );
                stats.skipped += 1;
            }
        }
    }

    info!("Exported {} prompts ({} skipped)", stats.written, stats.skipped);
    Ok(stats)
}
