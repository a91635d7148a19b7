//! Cascade Configuration
//!
//! Externally adjustable constants for the phase orchestrator. Nothing in the
//! orchestrator hard-codes these values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// What happens when a phase fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// The run is torn down; a fresh `start` is required
    #[default]
    Terminal,
}

/// Timing and truncation settings for one orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// How long the motion phase samples before moving on
    #[serde(default = "default_motion_duration_ms")]
    pub motion_duration_ms: u64,
    /// Only the most recent N characters of each history feed the fusion stage
    #[serde(default = "default_fusion_history_chars")]
    pub fusion_history_chars: usize,
    /// Behavior after a phase failure
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_motion_duration_ms() -> u64 {
    10_000
}

fn default_fusion_history_chars() -> usize {
    200
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            motion_duration_ms: default_motion_duration_ms(),
            fusion_history_chars: default_fusion_history_chars(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl CascadeConfig {
    /// Set the motion phase duration
    pub fn with_motion_duration(mut self, duration: Duration) -> Self {
        self.motion_duration_ms = duration.as_millis() as u64;
        self
    }

    /// Set the fusion input cap
    pub fn with_fusion_history_chars(mut self, chars: usize) -> Self {
        self.fusion_history_chars = chars;
        self
    }

    pub fn motion_duration(&self) -> Duration {
        Duration::from_millis(self.motion_duration_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.motion_duration_ms == 0 {
            return Err(CoreError::validation("motion_duration_ms must be positive"));
        }
        if self.fusion_history_chars == 0 {
            return Err(CoreError::validation(
                "fusion_history_chars must be at least 1",
            ));
        }
        Ok(())
    }
}
