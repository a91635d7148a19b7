//! Per-run sensing resources for the local device.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use sensing_cascade_core::{CoreResult, LocationSource, MotionSource, SourceProvider};
use sensing_cascade_llm::{InferenceOptions, TextGenerator};

use super::location::LlmLocationAnalyzer;
use super::motion::SyntheticMotionDetector;
use crate::storage::{LocationResponseStore, MotionHistoryStore};

/// Creates a fresh motion detector or location analyzer per acquisition
pub struct DeviceSourceProvider {
    generator: Arc<dyn TextGenerator>,
    location_options: InferenceOptions,
    motion_store: Arc<MotionHistoryStore>,
    location_store: Arc<LocationResponseStore>,
    sample_interval: Duration,
    handle: Handle,
}

impl DeviceSourceProvider {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        location_options: InferenceOptions,
        motion_store: Arc<MotionHistoryStore>,
        location_store: Arc<LocationResponseStore>,
        sample_interval: Duration,
        handle: Handle,
    ) -> Self {
        Self {
            generator,
            location_options,
            motion_store,
            location_store,
            sample_interval,
            handle,
        }
    }
}

impl SourceProvider for DeviceSourceProvider {
    fn acquire_motion(&self) -> CoreResult<Arc<dyn MotionSource>> {
        debug!("Acquiring motion detector");
        Ok(Arc::new(SyntheticMotionDetector::new(
            self.motion_store.clone(),
            self.sample_interval,
            self.handle.clone(),
        )))
    }

    fn acquire_location(&self) -> CoreResult<Arc<dyn LocationSource>> {
        debug!(model = self.generator.model(), "Acquiring location analyzer");
        Ok(Arc::new(LlmLocationAnalyzer::new(
            self.generator.clone(),
            self.location_options.clone(),
            self.location_store.clone(),
        )))
    }
}
