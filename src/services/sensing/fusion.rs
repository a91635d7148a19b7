//! Fusion stages
//!
//! `PlaceholderFusion` restates the context deterministically; it is the
//! default so a run completes without an inference server.
//! `InferenceFusion` asks a text generator for a short activity summary.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use sensing_cascade_core::{CoreResult, FusionStage};
use sensing_cascade_llm::{prompts::fusion_prompt, InferenceOptions, TextGenerator};

pub struct PlaceholderFusion;

#[async_trait]
impl FusionStage for PlaceholderFusion {
    async fn fuse(&self, motion_context: &str, location_context: &str) -> CoreResult<String> {
        Ok(format!(
            "Context summary | Motion: {} | Location: {}",
            single_line(motion_context),
            single_line(location_context)
        ))
    }
}

fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct InferenceFusion {
    generator: Arc<dyn TextGenerator>,
    options: InferenceOptions,
}

impl InferenceFusion {
    pub fn new(generator: Arc<dyn TextGenerator>, options: InferenceOptions) -> Self {
        Self { generator, options }
    }
}

#[async_trait]
impl FusionStage for InferenceFusion {
    async fn fuse(&self, motion_context: &str, location_context: &str) -> CoreResult<String> {
        let prompt = fusion_prompt(motion_context, location_context);
        debug!(model = self.generator.model(), %prompt, "Fusion prompt");
        Ok(self.generator.generate(&prompt, &self.options).await?)
    }
}
