//! Configuration for the generator

use crate::error::{GeneratorError, Result};
use payqa_domain::{ControlSet, Exemplar};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default per-call timeout (seconds)
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;

/// Run configuration recognized by the generator
///
/// ```toml
/// questions = ["Is the vendor on the approved list?"]
///
/// [controls]
/// amount_threshold = 10000
/// vendor_whitelist = ["Acme", "Globex"]
///
/// [few_shot]
/// file = "few_shot_examples.jsonl"
///
/// [generation]
/// batch_size = 8
/// call_timeout_secs = 60
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Control definitions rendered into every prompt
    pub controls: ControlSet,

    /// Questions posed to records that carry none of their own
    pub questions: Vec<String>,

    /// Few-shot exemplar sources
    pub few_shot: FewShotConfig,

    /// Batching and concurrency settings
    pub generation: GenerationConfig,
}

/// Where few-shot exemplars come from
///
/// Inline `examples` win; `file` is only read when no inline example exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FewShotConfig {
    /// Exemplars embedded in the configuration
    pub examples: Vec<Exemplar>,

    /// Line-delimited exemplar store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Batching and concurrency settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Records per batch; all records in one batch when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Upper bound on in-flight calls; the batch size when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    /// Maximum time for a single backend call (seconds)
    pub call_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            batch_size: None,
            max_concurrency: None,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
        }
    }
}

impl GenerationConfig {
    /// Batch size to use for `total` records (never zero)
    pub fn effective_batch_size(&self, total: usize) -> usize {
        self.batch_size.unwrap_or(total).max(1)
    }

    /// Number of calls allowed in flight for a batch of `batch_len` prompts
    pub fn concurrency_for(&self, batch_len: usize) -> usize {
        let cap = self.max_concurrency.unwrap_or(batch_len);
        cap.min(batch_len).max(1)
    }

    /// Per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl GeneratorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.generation.batch_size == Some(0) {
            return Err(GeneratorError::Config(
                "generation.batch_size must be at least 1".to_string(),
            ));
        }
        if self.generation.max_concurrency == Some(0) {
            return Err(GeneratorError::Config(
                "generation.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.generation.call_timeout_secs == 0 {
            return Err(GeneratorError::Config(
                "generation.call_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load and validate configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| GeneratorError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json_str)
            .map_err(|e| GeneratorError::Config(format!("Failed to parse JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| GeneratorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
