//! payqa LLM Backend Layer
//!
//! Pluggable generative backends behind the [`TextGenerator`] and
//! [`BulkGenerator`] traits.
//!
//! # Architecture
//!
//! The dispatcher in `payqa-generator` receives a [`Backend`] handle that is
//! either bulk-capable or single-prompt only. The choice is made once, when the
//! handle is built.
//!
//! # Backends
//!
//! - `MockBackend`: Deterministic mock for testing (both shapes)
//! - `GeminiBackend`: Google Generative Language REST API (single prompt)
//! - `OllamaBackend`: Local Ollama API (single prompt)
//!
//! # Examples
//!
//! ```
//! use payqa_llm::{MockBackend, TextGenerator};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backend = MockBackend::new("Hello from LLM!");
//! let result = backend.generate("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod gemini;
pub mod ollama;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use backend::{Backend, BulkGenerator, TextGenerator};
pub use gemini::GeminiBackend;
pub use ollama::OllamaBackend;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Communication(format!("Request failed: {}", e))
        }
    }
}

/// Scripted reply for [`MockBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Return this text
    Text(String),

    /// Fail the call with [`LlmError::Other`]
    Error(String),

    /// Wait, then return this text
    Delayed {
        /// How long to wait before replying
        delay: Duration,
        /// Reply text
        text: String,
    },
}

/// Mock backend for deterministic testing
///
/// Returns pre-configured replies without making any network calls. A reply is
/// chosen by exact prompt first, then by the first substring rule contained in
/// the prompt, then the default reply.
///
/// # Examples
///
/// ```
/// use payqa_llm::{MockBackend, TextGenerator};
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut backend = MockBackend::default();
/// backend.add_response("prompt1", "response1");
/// backend.add_rule("PAY-002", "[]");
/// backend.add_error("bad prompt");
///
/// assert_eq!(backend.generate("prompt1").await.unwrap(), "response1");
/// assert_eq!(backend.generate("... PAY-002 ...").await.unwrap(), "[]");
/// assert!(backend.generate("bad prompt").await.is_err());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, MockReply>>>,
    rules: Arc<Mutex<Vec<(String, MockReply)>>>,
    bulk_failure: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
    bulk_call_count: Arc<Mutex<usize>>,
}

impl MockBackend {
    /// Create a new MockBackend with a fixed reply for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            rules: Arc::new(Mutex::new(Vec::new())),
            bulk_failure: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
            bulk_call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a specific reply for an exact prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.lock_responses()
            .insert(prompt.into(), MockReply::Text(response.into()));
    }

    /// Configure an exact prompt to fail
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.lock_responses()
            .insert(prompt.into(), MockReply::Error("Mock error".to_string()));
    }

    /// Reply with `response` to any prompt containing `fragment`
    pub fn add_rule(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        self.add_scripted_rule(fragment, MockReply::Text(response.into()));
    }

    /// Fail any prompt containing `fragment`
    pub fn add_error_rule(&mut self, fragment: impl Into<String>) {
        self.add_scripted_rule(fragment, MockReply::Error("Mock error".to_string()));
    }

    /// Attach an arbitrary scripted reply to prompts containing `fragment`
    pub fn add_scripted_rule(&mut self, fragment: impl Into<String>, reply: MockReply) {
        self.rules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((fragment.into(), reply));
    }

    /// Make every bulk call fail with a communication error
    pub fn fail_bulk(&mut self, message: impl Into<String>) {
        *self.bulk_failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    /// Number of single-prompt calls made
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of bulk calls made
    pub fn bulk_call_count(&self) -> usize {
        *self.bulk_call_count.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reset both call counters
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner()) = 0;
        *self.bulk_call_count.lock().unwrap_or_else(|e| e.into_inner()) = 0;
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, HashMap<String, MockReply>> {
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reply_for(&self, prompt: &str) -> MockReply {
        if let Some(reply) = self.lock_responses().get(prompt) {
            return reply.clone();
        }

        let rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        rules
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl TextGenerator for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;

        match self.reply_for(prompt) {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(message) => Err(LlmError::Other(message)),
            MockReply::Delayed { delay, text } => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl BulkGenerator for MockBackend {
    async fn generate_bulk(&self, prompts: &[String]) -> Result<Vec<String>, LlmError> {
        *self.bulk_call_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;

        let failure = self.bulk_failure.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(message) = failure {
            return Err(LlmError::Communication(message));
        }

        let mut replies = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            match self.reply_for(prompt) {
                MockReply::Text(text) | MockReply::Delayed { text, .. } => replies.push(text),
                MockReply::Error(message) => return Err(LlmError::Other(message)),
            }
        }
        Ok(replies)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
