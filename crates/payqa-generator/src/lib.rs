//! payqa Generator
//!
//! Turns payment records into evaluation prompts, dispatches them to a
//! generative backend, and normalizes the free-text replies into
//! question/answer predictions.
//!
//! # Architecture
//!
//! ```text
//! Records + Config → PromptBuilder → Dispatcher → Backend
//!                         ↑              ↓
//!                   load_exemplars    extract → to_qa_pairs → PredictionSink
//! ```
//!
//! # Guarantees
//!
//! - Exactly one [`PredictionRecord`] per input record. A failed, timed-out,
//!   or unparseable call yields an empty answer list for that record only.
//! - A record without questions, or a failed bulk call, aborts the run with
//!   [`GeneratorError`].
//! - Prompts are a pure function of record, controls, questions and exemplars.
//!
//! # Example Usage
//!
//! ```no_run
//! use payqa_generator::{load_exemplars, parse_records, Dispatcher, GeneratorConfig, PredictionWriter};
//! use payqa_llm::{Backend, MockBackend};
//!
//! # async fn example() -> payqa_generator::Result<()> {
//! let config = GeneratorConfig::from_toml(r#"
//!     questions = ["Is the vendor on the approved list?"]
//!
//!     [controls]
//!     vendor_whitelist = ["Acme", "Globex"]
//!
//!     [generation]
//!     batch_size = 4
//! "#)?;
//!
//! let records = parse_records(r#"[{"record_id": "PAY-1", "vendor": "Acme"}]"#)?;
//! let exemplars = load_exemplars(&config.few_shot, None);
//!
//! let dispatcher = Dispatcher::new(Backend::single(MockBackend::new("[]")), config.generation.clone());
//! let writer = PredictionWriter::create("predictions.jsonl")?;
//! let stats = dispatcher
//!     .dispatch_into(&records, &config.questions, &config.controls, &exemplars, &writer)
//!     .await?;
//! writer.finish()?;
//!
//! println!("{} records, {} answers", stats.records, stats.answered_pairs);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod audit;
mod config;
mod dispatcher;
mod error;
mod export;
mod fewshot;
mod input;
mod normalize;
mod parser;
mod prompt;
mod report;
mod writer;


pub use audit::{excerpt, prompt_digest, AuditEntry, AuditLog, CallStatus, EXCERPT_CHARS};
pub use config::{FewShotConfig, GenerationConfig, GeneratorConfig, DEFAULT_CALL_TIMEOUT_SECS};
pub use dispatcher::{DispatchStats, Dispatcher};
pub use error::{GeneratorError, Result};
pub use export::{export_prompts, ExportStats, PromptLine};
pub use fewshot::{load_exemplars, load_jsonl};
pub use input::{load_records, parse_records};
pub use normalize::{normalize, to_qa_pairs};
pub use parser::extract;
pub use prompt::{build_prompt, PromptBuilder};
pub use report::{load_predictions, Report};
pub use writer::{JsonlWriter, PredictionSink, PredictionWriter};

pub use payqa_domain::PredictionRecord;
