//! Resolve few-shot exemplars from configuration or a JSONL store

use crate::config::FewShotConfig;
use payqa_domain::Exemplar;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// Resolve the exemplars for a run
///
/// Inline exemplars win. Otherwise `few_shot.file` is read as one JSON
/// exemplar per line, resolved against `base_dir` when relative. A missing or
/// unreadable store yields no exemplars. A corrupt line is skipped with a
/// warning and the remaining lines are still loaded.
pub fn load_exemplars(config: &FewShotConfig, base_dir: Option<&Path>) -> Vec<Exemplar> {
    if !config.examples.is_empty() {
        info!("Using {} inline few-shot examples", config.examples.len());
        return config.examples.clone();
    }

    let Some(file) = &config.file else {
        warn!("No few-shot examples configured, proceeding zero-shot");
        return Vec::new();
    };

    let path = match base_dir {
        Some(dir) if file.is_relative() => dir.join(file),
        _ => file.clone(),
    };

    let exemplars = load_jsonl(&path);
    if exemplars.is_empty() {
        warn!("No usable few-shot examples in {}, proceeding zero-shot", path.display());
    }
    exemplars
}

/// Parse a JSONL exemplar store, skipping blank and corrupt lines
pub fn load_jsonl(path: &Path) -> Vec<Exemplar> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Few-shot file not found at {}", path.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to read few-shot file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut exemplars = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Exemplar>(line) {
            Ok(exemplar) => exemplars.push(exemplar),
            Err(e) => warn!(
                "Skipping malformed few-shot example at {}:{}: {}",
                path.display(),
                line_no + 1,
                e
            ),
        }
    }

    info!("Loaded {} few-shot examples from {}", exemplars.len(), path.display());
    exemplars
}
