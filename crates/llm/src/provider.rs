//! Text Generator Trait
//!
//! Defines the common interface for all inference backends. The sensing
//! stages treat generation as an opaque prompt-in, text-out service.

use async_trait::async_trait;

use super::types::{InferenceOptions, LlmResult};

/// Trait that all text generation backends must implement.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the backend name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Generate a complete response for a single prompt.
    async fn generate(&self, prompt: &str, options: &InferenceOptions) -> LlmResult<String>;

    /// Check if the backend is reachable and the model is available.
    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }
}
