//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use payqa_generator::{DispatchStats, ExportStats};
use serde_json::json;
use std::path::Path;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Summarize a predict run.
    pub fn predict_summary(&self, stats: &DispatchStats, output: &Path) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "output": output.display().to_string(),
                "stats": stats,
            }))?),
            OutputFormat::Quiet => Ok(output.display().to_string()),
            OutputFormat::Table => {
                let table = self.metrics_table(&[
                    ("Records", stats.records.to_string()),
                    ("Batches", stats.batches.to_string()),
                    ("Bulk batches", stats.bulk_batches.to_string()),
                    ("Parallel batches", stats.fallback_batches.to_string()),
                    ("Failed calls", stats.failed_calls.to_string()),
                    ("Timed-out calls", stats.timed_out_calls.to_string()),
                    ("Answers", stats.answered_pairs.to_string()),
                ]);

                let headline = format!(
                    "Wrote {} predictions to {}",
                    stats.records,
                    output.display()
                );
                let mut out = format!("{}\n{}", self.success(&headline), table);
                if stats.degraded_records() > 0 {
                    let warning = format!(
                        "{} record(s) have no answers because their call failed",
                        stats.degraded_records()
                    );
                    out.push('\n');
                    out.push_str(&self.warning(&warning));
                }
                Ok(out)
            }
        }
    }

    /// Summarize a prompt export.
    pub fn export_summary(&self, stats: &ExportStats, output: &Path) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "output": output.display().to_string(),
                "stats": stats,
            }))?),
            OutputFormat::Quiet => Ok(output.display().to_string()),
            OutputFormat::Table => {
                let mut out = self.success(&format!(
                    "Wrote {} prompts to {}",
                    stats.written,
                    output.display()
                ));
                if stats.skipped > 0 {
                    out.push('\n');
                    out.push_str(&self.warning(&format!("Skipped {} record(s)", stats.skipped)));
                }
                Ok(out)
            }
        }
    }

    /// Summarize a report export.
    pub fn report_summary(&self, rows: usize, columns: usize, output: &Path) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "output": output.display().to_string(),
                "rows": rows,
                "columns": columns,
            }))?),
            OutputFormat::Quiet => Ok(output.display().to_string()),
            OutputFormat::Table => Ok(self.success(&format!(
                "Wrote {} rows x {} columns to {}",
                rows,
                columns,
                output.display()
            ))),
        }
    }

    fn metrics_table(&self, metrics: &[(&str, String)]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value"]);
        for (name, value) in metrics {
            builder.push_record([name.to_string(), value.clone()]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
