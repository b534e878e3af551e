//! Error types for the generator

use payqa_domain::RecordError;
use thiserror::Error;

/// Errors that abort a generator operation
///
/// Per-call backend failures and unparseable replies are not errors at this
/// level: they degrade the affected record to an empty prediction.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Malformed input record
    #[error("Validation error for {record}: {reason}")]
    Validation {
        /// Record identifier, or its position when no identifier is known
        record: String,
        /// What is wrong
        reason: String,
    },

    /// A field required to build a prompt is absent
    #[error("Record '{record_id}' is missing required field '{field}'")]
    MissingField {
        /// Identifier of the offending record
        record_id: String,
        /// Name of the missing field
        field: String,
    },

    /// The backend could not serve a bulk call
    #[error("Backend transport error: {0}")]
    BackendTransport(String),

    /// Configuration could not be parsed or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RecordError> for GeneratorError {
    fn from(e: RecordError) -> Self {
        let record = match &e {
            RecordError::NotAnObject { index }
            | RecordError::MissingId { index }
            | RecordError::InvalidId { index } => format!("record #{}", index),
            RecordError::InvalidQuestions { record_id, .. } => format!("record '{}'", record_id),
        };
        GeneratorError::Validation {
            record,
            reason: e.to_string(),
        }
    }
}

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;
