//! Input record loading

use crate::error::{GeneratorError, Result};
use payqa_domain::Record;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// Load records from a JSON array file
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let records = parse_records(&contents)?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse a JSON array of record objects
///
/// # Errors
///
/// - [`GeneratorError::Json`] if the text is not JSON
/// - [`GeneratorError::Validation`] if the top level is not an array, an
///   element is not a valid record, or a `record_id` repeats
pub fn parse_records(json: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(GeneratorError::Validation {
            record: "input".to_string(),
            reason: "expected a JSON array of records".to_string(),
        });
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let record = Record::from_value(index, item)?;
        if !seen.insert(record.id().to_string()) {
            return Err(GeneratorError::Validation {
                record: format!("record '{}'", record.id()),
                reason: format!("duplicate record_id at position {}", index),
            });
        }
        records.push(record);
    }

    Ok(records)
}
