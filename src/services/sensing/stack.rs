//! Wiring of the device adapters from application settings.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::info;

use sensing_cascade_core::{FusionStage, HostContext, NetworkScanner};
use sensing_cascade_llm::{CannedGenerator, OllamaGenerator, TextGenerator};

use super::fusion::{InferenceFusion, PlaceholderFusion};
use super::provider::DeviceSourceProvider;
use super::wifi::{CommandWifiScanner, StaticNetworkScanner};
use crate::models::settings::{AppConfig, FusionMode};
use crate::services::cascade::{Collaborators, ResultAggregator};
use crate::storage::{LocationResponseStore, MotionHistoryStore};
use crate::utils::error::AppResult;
use crate::utils::paths::ensure_dir;

const OFFLINE_REPLY: &str =
    "Offline mode: no inference backend was queried. The nearby networks suggest an indoor space.";

/// The adapters for one application configuration
pub struct SensingStack {
    pub generator: Arc<dyn TextGenerator>,
    pub motion_store: Arc<MotionHistoryStore>,
    pub location_store: Arc<LocationResponseStore>,
    pub provider: Arc<DeviceSourceProvider>,
    pub scanner: Arc<dyn NetworkScanner>,
    pub fusion: Arc<dyn FusionStage>,
}

impl SensingStack {
    pub fn build(config: &AppConfig, data_dir: &Path, handle: Handle) -> AppResult<Self> {
        ensure_dir(data_dir)?;

        let generator: Arc<dyn TextGenerator> = if config.offline {
            Arc::new(CannedGenerator::new(OFFLINE_REPLY))
        } else {
            Arc::new(OllamaGenerator::new(config.inference.provider.clone()))
        };
        info!(provider = generator.name(), model = generator.model(), "Text generator ready");

        let motion_store = Arc::new(MotionHistoryStore::new(data_dir, config.motion.history_limit));
        let location_store = Arc::new(LocationResponseStore::new(data_dir));

        let provider = Arc::new(DeviceSourceProvider::new(
            generator.clone(),
            config.inference.location.clone(),
            motion_store.clone(),
            location_store.clone(),
            Duration::from_millis(config.motion.sample_interval_ms),
            handle,
        ));

        let scanner: Arc<dyn NetworkScanner> = if config.scanner.static_networks.is_empty() {
            Arc::new(CommandWifiScanner::new(
                config.scanner.command.clone(),
                Duration::from_secs(config.scanner.cache_ttl_secs),
            ))
        } else {
            Arc::new(StaticNetworkScanner::new(config.scanner.static_networks.clone()))
        };

        let fusion: Arc<dyn FusionStage> = match config.fusion_mode {
            FusionMode::Placeholder => Arc::new(PlaceholderFusion),
            FusionMode::Inference => Arc::new(InferenceFusion::new(
                generator.clone(),
                config.inference.fusion.clone(),
            )),
        };

        Ok(Self {
            generator,
            motion_store,
            location_store,
            provider,
            scanner,
            fusion,
        })
    }

    pub fn collaborators(&self, host: Arc<dyn HostContext>) -> Collaborators {
        Collaborators {
            sources: self.provider.clone(),
            scanner: self.scanner.clone(),
            fusion: self.fusion.clone(),
            motion_history: self.motion_store.clone(),
            location_history: self.location_store.clone(),
            host,
        }
    }

    pub fn aggregator(&self) -> ResultAggregator {
        ResultAggregator::new(self.motion_store.clone(), self.location_store.clone())
    }
}
