//! Backend capability traits
//!
//! A generative backend is reached through one of two shapes. Which one a
//! backend offers is decided when the [`Backend`] handle is built, never probed
//! per call.

use crate::LlmError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Single-prompt generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate one reply for one prompt
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model name used in logs and audit entries
    fn model_name(&self) -> &str {
        "llm"
    }
}

/// Bulk generation: many prompts in one backend invocation
#[async_trait]
pub trait BulkGenerator: Send + Sync {
    /// Generate one reply per prompt, in submission order
    ///
    /// An error means the whole call failed; implementations never return a
    /// partial result.
    async fn generate_bulk(&self, prompts: &[String]) -> Result<Vec<String>, LlmError>;

    /// Model name used in logs and audit entries
    fn model_name(&self) -> &str {
        "llm"
    }
}

/// Handle to a backend, tagged with the capability it offers
#[derive(Clone)]
pub enum Backend {
    /// Accepts a whole batch of prompts per call
    BulkCapable(Arc<dyn BulkGenerator>),

    /// Accepts one prompt per call; batches are fanned out in parallel
    SingleOnly(Arc<dyn TextGenerator>),
}

impl Backend {
    /// Wrap a bulk-capable generator
    pub fn bulk<B: BulkGenerator + 'static>(generator: B) -> Self {
        Backend::BulkCapable(Arc::new(generator))
    }

    /// Wrap a single-prompt generator
    pub fn single<G: TextGenerator + 'static>(generator: G) -> Self {
        Backend::SingleOnly(Arc::new(generator))
    }

    /// Whether batches go through one bulk call
    pub fn is_bulk_capable(&self) -> bool {
        matches!(self, Backend::BulkCapable(_))
    }

    /// Model name of the wrapped generator
    pub fn model_name(&self) -> &str {
        match self {
            Backend::BulkCapable(b) => b.model_name(),
            Backend::SingleOnly(g) => g.model_name(),
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_bulk_capable() { "BulkCapable" } else { "SingleOnly" };
        f.debug_struct("Backend")
            .field("kind", &kind)
            .field("model", &self.model_name())
            .finish()
    }
}
