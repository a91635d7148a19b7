//! Location analysis through a text generator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use sensing_cascade_core::{CoreError, CoreResult, LocationSource};
use sensing_cascade_llm::{prompts::location_prompt, InferenceOptions, TextGenerator};

use crate::storage::LocationResponseStore;

/// Infers a location from nearby network names and persists the answer
pub struct LlmLocationAnalyzer {
    generator: Arc<dyn TextGenerator>,
    options: InferenceOptions,
    store: Arc<LocationResponseStore>,
    closed: AtomicBool,
}

impl LlmLocationAnalyzer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        options: InferenceOptions,
        store: Arc<LocationResponseStore>,
    ) -> Self {
        Self {
            generator,
            options,
            store,
            closed: AtomicBool::new(false),
        }
    }

    pub fn last_response(&self) -> Option<String> {
        self.store.last_response().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read last location response");
            None
        })
    }
}

#[async_trait]
impl LocationSource for LlmLocationAnalyzer {
    async fn analyze(&self, networks: &[String]) -> CoreResult<String> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CoreError::released("location analyzer"));
        }
        if networks.is_empty() {
            warn!("No networks in range, analyzing an empty list");
        }

        let prompt = location_prompt(networks);
        debug!(
            provider = self.generator.name(),
            model = self.generator.model(),
            %prompt,
            "Location prompt"
        );

        let response = self.generator.generate(&prompt, &self.options).await?;
        self.store.save_response(&response)?;
        info!(chars = response.len(), "Location response stored");
        Ok(response)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Location analyzer closed");
        }
    }
}
