//! Settings Models
//!
//! Application configuration and settings data structures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use sensing_cascade_core::CascadeConfig;
use sensing_cascade_llm::{InferenceOptions, ProviderConfig};

/// Which fusion stage the cascade runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionMode {
    /// Deterministic summary built from the two contexts
    #[default]
    Placeholder,
    /// Summary generated by the inference backend
    Inference,
}

impl FusionMode {
    /// Parse fusion mode from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "placeholder" => Some(FusionMode::Placeholder),
            "inference" => Some(FusionMode::Inference),
            _ => None,
        }
    }
}

/// Inference backend and per-stage sampling options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceSettings {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default = "InferenceOptions::location")]
    pub location: InferenceOptions,
    #[serde(default = "InferenceOptions::fusion")]
    pub fusion: InferenceOptions,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            location: InferenceOptions::location(),
            fusion: InferenceOptions::fusion(),
        }
    }
}

/// Synthetic motion detector settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionSettings {
    /// Interval between sample batches
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    /// Detections kept in the persisted history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_sample_interval_ms() -> u64 {
    1_000
}

fn default_history_limit() -> usize {
    10
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            history_limit: default_history_limit(),
        }
    }
}

/// Wi-Fi scanning settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Scanner executable; invoked as `<command> -t -f SSID dev wifi list`
    #[serde(default = "default_scan_command")]
    pub command: String,
    /// When non-empty, these names are reported instead of scanning
    #[serde(default)]
    pub static_networks: Vec<String>,
    /// How long a scan result is reused
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_scan_command() -> String {
    "nmcli".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    30
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            command: default_scan_command(),
            static_networks: Vec::new(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Orchestrator timing and truncation
    #[serde(default)]
    pub cascade: CascadeConfig,
    /// Inference backend
    #[serde(default)]
    pub inference: InferenceSettings,
    /// Fusion stage selection
    #[serde(default)]
    pub fusion_mode: FusionMode,
    /// Motion detector
    #[serde(default)]
    pub motion: MotionSettings,
    /// Network scanner
    #[serde(default)]
    pub scanner: ScannerSettings,
    /// Answer inference calls with canned text instead of contacting a server
    #[serde(default)]
    pub offline: bool,
    /// History directory override (defaults to ~/.sensing-cascade/data)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub motion_duration_ms: Option<u64>,
    pub fusion_history_chars: Option<usize>,
    pub fusion_mode: Option<FusionMode>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub offline: Option<bool>,
    pub static_networks: Option<Vec<String>>,
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(duration) = update.motion_duration_ms {
            self.cascade.motion_duration_ms = duration;
        }
        if let Some(chars) = update.fusion_history_chars {
            self.cascade.fusion_history_chars = chars;
        }
        if let Some(mode) = update.fusion_mode {
            self.fusion_mode = mode;
        }
        if let Some(model) = update.model {
            self.inference.provider.model = model;
        }
        if let Some(base_url) = update.base_url {
            self.inference.provider.base_url = Some(base_url);
        }
        if let Some(offline) = update.offline {
            self.offline = offline;
        }
        if let Some(networks) = update.static_networks {
            self.scanner.static_networks = networks;
        }
        if let Some(dir) = update.data_dir {
            self.data_dir = Some(dir);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.cascade.validate().map_err(|e| e.to_string())?;
        self.inference.location.validate()?;
        self.inference.fusion.validate()?;

        if self.inference.provider.model.trim().is_empty() {
            return Err("inference model must not be empty".to_string());
        }

        if self.motion.sample_interval_ms == 0 {
            return Err("sample_interval_ms must be positive".to_string());
        }

        if self.motion.history_limit == 0 || self.motion.history_limit > 1_000 {
            return Err(format!(
                "history_limit must be within 1..=1000, got {}",
                self.motion.history_limit
            ));
        }

        if self.scanner.static_networks.is_empty() && self.scanner.command.trim().is_empty() {
            return Err("scanner needs a command or a static network list".to_string());
        }

        Ok(())
    }
}
