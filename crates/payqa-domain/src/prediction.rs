//! Prediction module - per-record output

use crate::answer::Answer;
use serde::{Deserialize, Serialize};

/// One evaluated question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    /// Question text as posed
    pub question: String,

    /// Normalized answer
    #[serde(default)]
    pub answer: Answer,
}

impl QaPair {
    /// Create a new pair
    pub fn new(question: impl Into<String>, answer: Answer) -> Self {
        Self {
            question: question.into(),
            answer,
        }
    }
}

/// Output for one input record
///
/// Created once by the dispatcher and written once; an empty `answers` list
/// means the backend call for this record failed or produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Identifier of the evaluated record
    pub record_id: String,

    /// Answers in question order
    pub answers: Vec<QaPair>,
}

impl PredictionRecord {
    /// Create a prediction with answers
    pub fn new(record_id: impl Into<String>, answers: Vec<QaPair>) -> Self {
        Self {
            record_id: record_id.into(),
            answers,
        }
    }

    /// Create a prediction with no answers
    pub fn empty(record_id: impl Into<String>) -> Self {
        Self::new(record_id, Vec::new())
    }

    /// Whether no answers were produced
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Answer for a question, matched on exact text
    pub fn answer_for(&self, question: &str) -> Option<Answer> {
        self.answers
            .iter()
            .find(|qa| qa.question == question)
            .map(|qa| qa.answer)
    }
}
