//! Canned Generator
//!
//! Deterministic stand-in for an inference server. Used for offline demo runs
//! and for tests that need a generator without network access.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::provider::TextGenerator;
use super::types::{InferenceOptions, LlmError, LlmResult};

/// Number of recent prompts kept for inspection
pub const PROMPT_LOG_LIMIT: usize = 16;

/// Answers every prompt with a fixed reply and remembers the most recent
/// prompts it saw
pub struct CannedGenerator {
    reply: String,
    prompts: Mutex<VecDeque<String>>,
}

impl CannedGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::new(VecDeque::with_capacity(PROMPT_LOG_LIMIT)),
        }
    }

    /// The most recent prompts, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn model(&self) -> &str {
        "offline"
    }

    async fn generate(&self, prompt: &str, _options: &InferenceOptions) -> LlmResult<String> {
        let mut prompts = self.prompts.lock().map_err(|_| LlmError::Other {
            message: "prompt log poisoned".to_string(),
        })?;
        if prompts.len() == PROMPT_LOG_LIMIT {
            prompts.pop_front();
        }
        prompts.push_back(prompt.to_string());
        Ok(self.reply.clone())
    }
}
