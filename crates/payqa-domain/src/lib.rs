//! payqa Domain Layer
//!
//! Core data model for the payment-control QA pipeline. Every type here is a
//! plain value: records are read once and never mutated, control sets and
//! exemplars are shared read-only for the duration of a run, and prediction
//! records are produced exactly once per input record.
//!
//! ## Key Concepts
//!
//! - **Record**: one subject to evaluate (a payment), identified by `record_id`
//! - **ControlSet**: named control parameters rendered into every prompt
//! - **Exemplar**: a worked example used for few-shot prompting
//! - **Answer**: the closed `Yes` / `No` / `Not Applicable` vocabulary
//! - **PredictionRecord**: the ordered question/answer pairs for one record
//!
//! ## Architecture
//!
//! This crate performs no I/O. Loading, prompting and dispatch live in
//! `payqa-generator`; backend access lives in `payqa-llm`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod answer;
pub mod control;
pub mod exemplar;
pub mod prediction;
pub mod record;

// Re-exports for convenience
pub use answer::Answer;
pub use control::ControlSet;
pub use exemplar::Exemplar;
pub use prediction::{PredictionRecord, QaPair};
pub use record::{Record, RecordError};
