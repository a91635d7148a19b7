//! Progress delivery gate.
//!
//! Every progress callback of a run goes through one gate. The gate is held
//! while the callback runs and the run's cancellation token is checked under
//! it, so once `stop()` has cancelled the token and passed through the gate,
//! no further event for that run can reach the caller.

use std::cell::Cell;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use sensing_cascade_core::ProgressEvent;

use super::orchestrator::ProgressCallback;

thread_local! {
    /// Set while this thread is inside a progress callback
    static DELIVERING: Cell<bool> = const { Cell::new(false) };
}

struct DeliveringFlag {
    previous: bool,
}

impl DeliveringFlag {
    fn raise() -> Self {
        Self {
            previous: DELIVERING.with(|d| d.replace(true)),
        }
    }
}

impl Drop for DeliveringFlag {
    fn drop(&mut self) {
        DELIVERING.with(|d| d.set(self.previous));
    }
}

#[derive(Default)]
pub(crate) struct ProgressGate {
    lock: Mutex<()>,
}

impl ProgressGate {
    /// Deliver `event` unless the run was cancelled or `still_valid` says the
    /// event is stale. Returns whether the callback ran.
    pub(crate) fn deliver(
        &self,
        cancel: &CancellationToken,
        callback: &ProgressCallback,
        event: ProgressEvent,
        still_valid: impl FnOnce() -> bool,
    ) -> bool {
        let _guard = self.enter();
        if cancel.is_cancelled() || !still_valid() {
            return false;
        }
        run(callback, event);
        true
    }

    /// Deliver the last event of a run. `finish` ends the run under the gate
    /// and reports whether the run still owned its session; the callback only
    /// runs if it did, and by then the run is already over for the caller.
    pub(crate) fn deliver_final(
        &self,
        cancel: &CancellationToken,
        callback: &ProgressCallback,
        event: ProgressEvent,
        finish: impl FnOnce() -> bool,
    ) -> bool {
        let _guard = self.enter();
        if cancel.is_cancelled() || !finish() {
            return false;
        }
        run(callback, event);
        true
    }

    fn enter(&self) -> Option<MutexGuard<'_, ()>> {
        // A callback that triggers delivery again already holds the gate.
        if in_callback() {
            None
        } else {
            Some(self.lock.lock().unwrap_or_else(PoisonError::into_inner))
        }
    }

    /// Wait until no callback is running on another thread.
    ///
    /// A no-op when called from inside a callback (e.g. `stop()` issued by the
    /// progress handler itself).
    pub(crate) fn quiesce(&self) {
        if in_callback() {
            return;
        }
        drop(self.lock.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

fn run(callback: &ProgressCallback, event: ProgressEvent) {
    let _flag = DeliveringFlag::raise();
    callback(event);
}

fn in_callback() -> bool {
    DELIVERING.with(|d| d.get())
}
