//! Analysis Session
//!
//! Run-state owned by the orchestrator: the current phase, the one sensing
//! resource held right now, and the cancellation token for the pending step.
//! Resources are wrapped in leases whose `Drop` releases them, so every exit
//! path (completion, failure, stop, close) releases without extra bookkeeping.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use sensing_cascade_core::{LocationSource, MotionSource, Phase, SampleSink};

/// An acquired motion source; detection stops when the lease is dropped
pub(crate) struct MotionLease {
    source: Arc<dyn MotionSource>,
}

impl MotionLease {
    pub(crate) fn start(source: Arc<dyn MotionSource>, sink: SampleSink) -> Self {
        source.start_detection(sink);
        Self { source }
    }
}

impl Drop for MotionLease {
    fn drop(&mut self) {
        self.source.stop_detection();
        debug!("Motion source released");
    }
}

/// An acquired location source; closed when the lease is dropped
pub(crate) struct LocationLease {
    source: Arc<dyn LocationSource>,
}

impl LocationLease {
    pub(crate) fn new(source: Arc<dyn LocationSource>) -> Self {
        Self { source }
    }

    pub(crate) fn source(&self) -> Arc<dyn LocationSource> {
        self.source.clone()
    }
}

impl Drop for LocationLease {
    fn drop(&mut self) {
        self.source.close();
        debug!("Location source released");
    }
}

/// The single resource a session may hold. Holding both is unrepresentable.
pub(crate) enum HeldResource {
    Idle,
    Motion(MotionLease),
    Location(LocationLease),
}

impl HeldResource {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            HeldResource::Idle => "idle",
            HeldResource::Motion(_) => "motion",
            HeldResource::Location(_) => "location",
        }
    }
}

pub(crate) struct AnalysisSession {
    /// Correlates log lines of one run
    pub(crate) id: Uuid,
    pub(crate) run_id: u64,
    pub(crate) phase: Phase,
    pub(crate) cancel: CancellationToken,
    pub(crate) task: Option<JoinHandle<()>>,
    resource: HeldResource,
}

impl AnalysisSession {
    pub(crate) fn new(run_id: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            phase: Phase::Motion,
            cancel: CancellationToken::new(),
            task: None,
            resource: HeldResource::Idle,
        }
    }

    /// Release whatever is held. The returned resource is released when dropped.
    pub(crate) fn release(&mut self) -> HeldResource {
        std::mem::replace(&mut self.resource, HeldResource::Idle)
    }

    /// Take ownership of a freshly acquired resource; anything still held is
    /// released first.
    pub(crate) fn hold(&mut self, resource: HeldResource) {
        let previous = self.release();
        debug_assert!(
            matches!(previous, HeldResource::Idle),
            "acquired {} while still holding {}",
            resource.kind(),
            previous.kind()
        );
        drop(previous);
        self.resource = resource;
    }

    #[cfg(test)]
    pub(crate) fn holding(&self) -> &'static str {
        self.resource.kind()
    }

    /// Cancel pending work, abort the run task and release the held resource
    pub(crate) fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let released = self.release();
        debug!(session_id = %self.id, resource = released.kind(), "Session shut down");
        drop(released);
    }
}
