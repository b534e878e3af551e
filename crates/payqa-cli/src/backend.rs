//! Backend construction from configuration.

use crate::config::{ModelConfig, Provider};
use crate::error::Result;
use payqa_llm::{Backend, GeminiBackend, MockBackend, OllamaBackend};
use tracing::info;

/// Build the backend handle described by `model`.
///
/// Gemini and Ollama answer one prompt per request and are wrapped as
/// single-prompt backends. The mock provider can pose as either shape.
pub fn build_backend(model: &ModelConfig) -> Result<Backend> {
    let backend = match model.provider {
        Provider::Gemini => {
            let mut gemini = GeminiBackend::new(model.api_key()?, &model.name)?;
            if let Some(endpoint) = &model.endpoint {
                gemini = gemini.with_endpoint(endpoint);
            }
            if let Some(temperature) = model.temperature {
                gemini = gemini.with_temperature(temperature);
            }
            if let Some(max_tokens) = model.max_tokens {
                gemini = gemini.with_max_output_tokens(max_tokens);
            }
            Backend::single(gemini)
        }
        Provider::Ollama => {
            let mut ollama = match &model.endpoint {
                Some(endpoint) => OllamaBackend::new(endpoint, &model.name)?,
                None => OllamaBackend::default_endpoint(&model.name)?,
            };
            if let Some(temperature) = model.temperature {
                ollama = ollama.with_temperature(temperature);
            }
            if let Some(max_tokens) = model.max_tokens {
                ollama = ollama.with_max_tokens(max_tokens);
            }
            Backend::single(ollama)
        }
        Provider::Mock => {
            let mock = MockBackend::new(&model.mock_reply);
            if model.bulk {
                Backend::bulk(mock)
            } else {
                Backend::single(mock)
            }
        }
    };

    info!("Using {:?} backend (model: {})", model.provider, backend.model_name());
    Ok(backend)
}
