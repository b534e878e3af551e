//! Record module - one subject to be evaluated

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Attribute holding the record identifier
pub const ID_FIELD: &str = "record_id";

/// Attribute holding per-record questions
pub const QUESTIONS_FIELD: &str = "questions";

/// Reasons a JSON value cannot become a [`Record`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The value is not a JSON object
    #[error("record #{index} is not a JSON object")]
    NotAnObject {
        /// Position in the input array
        index: usize,
    },

    /// `record_id` is absent
    #[error("record #{index} has no 'record_id'")]
    MissingId {
        /// Position in the input array
        index: usize,
    },

    /// `record_id` is neither a string nor a number
    #[error("record #{index} has a 'record_id' that is not a string or number")]
    InvalidId {
        /// Position in the input array
        index: usize,
    },

    /// `questions` is present but not an array of strings
    #[error("record '{record_id}': {reason}")]
    InvalidQuestions {
        /// Identifier of the offending record
        record_id: String,
        /// What is wrong with the field
        reason: String,
    },
}

/// A single record (payment) to evaluate
///
/// Records are immutable once constructed. All attributes, including the
/// identifier and any `questions`, are retained so the record renders into
/// prompts exactly as it was supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    attributes: Map<String, Value>,
    questions: Option<Vec<String>>,
}

impl Record {
    /// Build a record from a JSON value
    ///
    /// # Parameters
    ///
    /// - `index`: position of the value in its source, used in error messages
    /// - `value`: a flat JSON object with at least `record_id`
    ///
    /// # Examples
    ///
    /// ```
    /// use payqa_domain::Record;
    /// use serde_json::json;
    ///
    /// let record = Record::from_value(0, json!({
    ///     "record_id": "PAY-001",
    ///     "amount": 250.0,
    ///     "questions": ["Was the payment approved?"]
    /// })).unwrap();
    ///
    /// assert_eq!(record.id(), "PAY-001");
    /// assert_eq!(record.questions().unwrap().len(), 1);
    /// ```
    pub fn from_value(index: usize, value: Value) -> Result<Self, RecordError> {
        let Value::Object(attributes) = value else {
            return Err(RecordError::NotAnObject { index });
        };

        let id = match attributes.get(ID_FIELD) {
            None | Some(Value::Null) => return Err(RecordError::MissingId { index }),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return Err(RecordError::InvalidId { index }),
        };

        let questions = match attributes.get(QUESTIONS_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            RecordError::InvalidQuestions {
                                record_id: id.clone(),
                                reason: format!("question #{} is not a string", i),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => {
                return Err(RecordError::InvalidQuestions {
                    record_id: id,
                    reason: format!("'{}' is not an array", QUESTIONS_FIELD),
                })
            }
        };

        Ok(Self {
            id,
            attributes,
            questions,
        })
    }

    /// Record identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All attributes as supplied
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Look up a single attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Questions attached to this record, if any
    pub fn questions(&self) -> Option<&[String]> {
        self.questions.as_deref()
    }

    /// Questions to pose: the record's own, otherwise `shared`
    ///
    /// Returns `None` when neither source has any question.
    pub fn effective_questions<'a>(&'a self, shared: &'a [String]) -> Option<&'a [String]> {
        match self.questions() {
            Some(own) => Some(own),
            None if !shared.is_empty() => Some(shared),
            None => None,
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}
