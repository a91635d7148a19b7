//! Ollama Generator
//!
//! Implementation of the TextGenerator trait for Ollama local inference
//! using the ollama-rs native SDK. No API keys; the model must already be
//! pulled on the server.

use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;
use tracing::debug;

use super::provider::TextGenerator;
use super::types::{InferenceOptions, LlmError, LlmResult, ProviderConfig};

/// Default Ollama API endpoint
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Ollama backend using the native ollama-rs SDK
pub struct OllamaGenerator {
    config: ProviderConfig,
    client: Ollama,
}

impl OllamaGenerator {
    /// Create a new Ollama generator with the given configuration
    pub fn new(config: ProviderConfig) -> Self {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(OLLAMA_DEFAULT_URL);

        let client = Self::create_client(base_url);

        Self { config, client }
    }

    /// Create an Ollama SDK client from a base URL string.
    ///
    /// Parses the URL to extract host and port for `Ollama::new()`.
    /// Falls back to `Ollama::default()` if parsing fails.
    fn create_client(base_url: &str) -> Ollama {
        if let Ok(parsed) = url::Url::parse(base_url) {
            let scheme = parsed.scheme();
            let host = parsed.host_str().unwrap_or("localhost");
            let port = parsed.port().unwrap_or(11434);
            // Ollama::new takes host and port separately
            let host_url = format!("{}://{}", scheme, host);
            Ollama::new(host_url, port)
        } else {
            Ollama::default()
        }
    }

    /// Get the base URL for the Ollama server (used in error messages)
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(OLLAMA_DEFAULT_URL)
    }

    fn model_options(options: &InferenceOptions) -> ModelOptions {
        let mut opts = ModelOptions::default()
            .temperature(options.temperature)
            .top_k(options.top_k)
            .num_predict(options.max_tokens as i32);
        if let Some(seed) = options.seed {
            opts = opts.seed(seed);
        }
        opts
    }

    /// Map an ollama-rs error to our `LlmError` type.
    fn map_ollama_error(&self, err: ollama_rs::error::OllamaError) -> LlmError {
        let msg = err.to_string();

        if msg.contains("connect") || msg.contains("Connection refused") {
            LlmError::ProviderUnavailable {
                message: format!(
                    "Cannot connect to Ollama at {}. Is the Ollama server running? \
                     Start it with: ollama serve",
                    self.base_url()
                ),
            }
        } else if msg.contains("not found") || msg.contains("404") {
            LlmError::ModelNotFound {
                model: self.config.model.clone(),
            }
        } else {
            LlmError::Other { message: msg }
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str, options: &InferenceOptions) -> LlmResult<String> {
        debug!(model = %self.config.model, chars = prompt.len(), "Sending prompt to Ollama");

        let request = GenerationRequest::new(self.config.model.clone(), prompt.to_string())
            .options(Self::model_options(options));

        let response = self
            .client
            .generate(request)
            .await
            .map_err(|e| self.map_ollama_error(e))?;

        let text = response.response.trim().to_string();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: self.name().to_string(),
            });
        }

        debug!(model = %self.config.model, chars = text.len(), "Received response from Ollama");
        Ok(text)
    }

    async fn health_check(&self) -> LlmResult<()> {
        let models = self
            .client
            .list_local_models()
            .await
            .map_err(|e| self.map_ollama_error(e))?;

        let wanted = self.config.model.as_str();
        if models
            .iter()
            .any(|m| m.name == wanted || m.name.starts_with(&format!("{}:", wanted)))
        {
            Ok(())
        } else {
            Err(LlmError::ModelNotFound {
                model: wanted.to_string(),
            })
        }
    }
}
