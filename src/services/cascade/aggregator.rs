//! Result Aggregator
//!
//! Builds the combined report delivered with the `Complete` phase from the
//! persisted motion and location histories.

use std::sync::Arc;

use serde::Serialize;

use sensing_cascade_core::HistoryReader;

pub const NO_MOTION_RESULTS: &str = "No motion data available";
pub const NO_LOCATION_RESULTS: &str = "No location data available";

/// Motion and location results of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinedResult {
    pub motion: String,
    pub location: String,
}

impl CombinedResult {
    pub fn render(&self) -> String {
        format!(
            "=== Motion Analysis Results ===\n{}\n\n=== Location Analysis Results ===\n{}",
            self.motion, self.location
        )
    }
}

impl std::fmt::Display for CombinedResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Clone)]
pub struct ResultAggregator {
    motion_history: Arc<dyn HistoryReader>,
    location_history: Arc<dyn HistoryReader>,
}

impl ResultAggregator {
    pub fn new(
        motion_history: Arc<dyn HistoryReader>,
        location_history: Arc<dyn HistoryReader>,
    ) -> Self {
        Self {
            motion_history,
            location_history,
        }
    }

    /// Missing or blank history is reported with a sentinel, never as an error
    pub fn aggregate(&self) -> CombinedResult {
        CombinedResult {
            motion: present_or(self.motion_history.read_history(), NO_MOTION_RESULTS),
            location: present_or(self.location_history.read_history(), NO_LOCATION_RESULTS),
        }
    }
}

fn present_or(history: Option<String>, sentinel: &str) -> String {
    history
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| sentinel.to_string())
}
