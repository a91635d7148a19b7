//! Sensing Collaborator Contracts
//!
//! The orchestrator never talks to sensors, scanners, inference backends, or
//! storage directly. It goes through the traits below, which keeps every stage
//! swappable and lets tests substitute deterministic fakes.
//!
//! Ownership: motion and location sources are *acquired* from a
//! [`SourceProvider`] per run and released by the orchestrator. History
//! readers, the network scanner and the fusion stage are shared for the
//! orchestrator's lifetime.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// Receives each batch of detected motion labels
pub type SampleSink = Arc<dyn Fn(&[String]) + Send + Sync>;

/// Severity of a host memory-pressure signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryPressure {
    Moderate,
    Low,
    Critical,
}

/// Continuous motion sampling.
///
/// `start_detection` must return without invoking the sink; samples arrive
/// later from the source's own thread or task. `stop_detection` must tolerate
/// being called without a matching start and must not wait for an in-flight
/// sink call to finish.
pub trait MotionSource: Send + Sync {
    fn start_detection(&self, on_sample: SampleSink);

    fn stop_detection(&self);

    /// Rendered motion history, `None` when nothing has been recorded
    fn history(&self) -> Option<String>;

    /// Returns whether anything was cleared
    fn clear_history(&self) -> bool;
}

/// One scan-and-infer location round trip
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Infer a location description from nearby network names.
    ///
    /// Implementations persist their own result before returning.
    async fn analyze(&self, networks: &[String]) -> CoreResult<String>;

    /// Release inference resources. Further `analyze` calls fail.
    fn close(&self);
}

/// Lists nearby wireless network names
#[async_trait]
pub trait NetworkScanner: Send + Sync {
    async fn scan(&self) -> CoreResult<Vec<String>>;

    fn trim_caches(&self, _level: MemoryPressure) {}
}

/// Combines the motion and location context into one summary
#[async_trait]
pub trait FusionStage: Send + Sync {
    async fn fuse(&self, motion_context: &str, location_context: &str) -> CoreResult<String>;

    fn trim_caches(&self, _level: MemoryPressure) {}
}

/// Read-only view over a persisted history
pub trait HistoryReader: Send + Sync {
    /// `None` when nothing has been persisted yet
    fn read_history(&self) -> Option<String>;
}

/// Hands out the per-run sensing resources
pub trait SourceProvider: Send + Sync {
    fn acquire_motion(&self) -> CoreResult<Arc<dyn MotionSource>>;

    fn acquire_location(&self) -> CoreResult<Arc<dyn LocationSource>>;

    fn trim_caches(&self, _level: MemoryPressure) {}
}

/// Capability check for the environment the orchestrator runs inside.
///
/// Checked at every phase entry; once it reports unavailable the run aborts
/// instead of touching a stale environment.
pub trait HostContext: Send + Sync {
    fn is_available(&self) -> bool;
}

impl<T: Send + Sync> HostContext for Weak<T> {
    fn is_available(&self) -> bool {
        self.strong_count() > 0
    }
}
