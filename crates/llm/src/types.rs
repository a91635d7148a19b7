//! LLM Types
//!
//! Errors, generation options and backend configuration shared by every
//! text generator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sensing_cascade_core::CoreError;

/// Errors from text generation backends
#[derive(Debug, Error)]
pub enum LlmError {
    /// Model not found or not pulled on the server
    #[error("Model not found: {model}")]
    ModelNotFound { model: String },
    /// Backend not reachable (e.g., Ollama not running)
    #[error("Provider unavailable: {message}")]
    ProviderUnavailable { message: String },
    /// Request rejected by the backend
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
    /// Backend answered with nothing usable
    #[error("Empty response from {provider}")]
    EmptyResponse { provider: String },
    /// Other error
    #[error("{message}")]
    Other { message: String },
}

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Inference failures surface to the orchestrator as collaborator failures
impl From<LlmError> for CoreError {
    fn from(err: LlmError) -> Self {
        CoreError::source(err.to_string())
    }
}

/// Sampling options for one generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceOptions {
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Top-k sampling cutoff
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    /// Temperature (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Fixed seed so temperature/top-k behave reproducibly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_top_k() -> u32 {
    40
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            top_k: default_top_k(),
            temperature: default_temperature(),
            seed: None,
        }
    }
}

impl InferenceOptions {
    /// Options used for location inference: focused and reproducible
    pub fn location() -> Self {
        Self {
            top_k: 100,
            seed: Some(101),
            ..Default::default()
        }
    }

    /// Options used for context fusion
    pub fn fusion() -> Self {
        Self {
            top_k: 20,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens == 0 {
            return Err("max_tokens must be positive".to_string());
        }
        if self.top_k == 0 {
            return Err("top_k must be positive".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            ));
        }
        Ok(())
    }
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL override (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name to use
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "gemma2:2b".to_string(),
        }
    }
}
