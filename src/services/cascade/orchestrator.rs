//! Phase Orchestrator
//!
//! Drives one sensing cascade run at a time through
//! `Motion → Location → Fusion → Complete`, reporting progress through a
//! caller-supplied callback.
//!
//! ## Lifecycle
//! - `start()` creates a session and spawns the run task, returning at once
//! - `stop()` cancels the run, releases the held resource and silences it
//! - `close()` stops and releases the orchestrator's own runtime
//!
//! ## Concurrency
//! The run task awaits every step inside a `tokio::select!` against the
//! session's `CancellationToken`. Resources are acquired and released under
//! the session lock, so at most one sensing resource is held at any instant,
//! across runs as well as within one. Progress goes through the delivery gate.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::{Handle, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sensing_cascade_core::{
    CascadeConfig, CoreError, CoreResult, FusionStage, HistoryReader, HostContext, LocationSource,
    MemoryPressure, NetworkScanner, Phase, ProgressEvent, SampleSink, SourceProvider,
};

use super::aggregator::ResultAggregator;
use super::delivery::ProgressGate;
use super::fusion_input::FusionInput;
use super::session::{AnalysisSession, HeldResource, LocationLease, MotionLease};
use crate::utils::error::AppResult;

pub const ALREADY_IN_PROGRESS: &str = "Analysis already in progress";
pub const CONTEXT_UNAVAILABLE: &str = "Analysis context is no longer available";
pub const MOTION_STARTED: &str = "Starting motion analysis...";
pub const LOCATION_STARTED: &str = "Starting location analysis...";
pub const FUSION_STARTED: &str = "Starting context fusion...";

/// Receives every progress event of a run
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Everything the orchestrator talks to
#[derive(Clone)]
pub struct Collaborators {
    pub sources: Arc<dyn SourceProvider>,
    pub scanner: Arc<dyn NetworkScanner>,
    pub fusion: Arc<dyn FusionStage>,
    pub motion_history: Arc<dyn HistoryReader>,
    pub location_history: Arc<dyn HistoryReader>,
    pub host: Arc<dyn HostContext>,
}

struct Shared {
    config: CascadeConfig,
    collaborators: Collaborators,
    aggregator: ResultAggregator,
    session: Mutex<Option<AnalysisSession>>,
    /// Mirror of the session phase, readable without the session lock
    phase: AtomicU8,
    gate: ProgressGate,
    next_run: AtomicU64,
}

impl Shared {
    fn session(&self) -> MutexGuard<'_, Option<AnalysisSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn phase(&self) -> Phase {
        Phase::from_ordinal(self.phase.load(Ordering::SeqCst))
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.store(phase.ordinal(), Ordering::SeqCst);
    }

    /// Forward a motion batch while the run is still sampling
    fn forward_samples(
        &self,
        cancel: &CancellationToken,
        on_progress: &ProgressCallback,
        motions: &[String],
    ) {
        debug!(count = motions.len(), "Motion samples received");
        let text = format!("Detected motions: {}", motions.join(", "));
        let event = ProgressEvent::update(text, Phase::Motion);
        self.gate
            .deliver(cancel, on_progress, event, || self.phase() == Phase::Motion);
    }
}

enum Executor {
    Owned(Runtime),
    Borrowed(Handle),
    Closed,
}

/// Sequential motion → location → fusion analyzer
pub struct PhaseOrchestrator {
    shared: Arc<Shared>,
    executor: Mutex<Executor>,
}

impl PhaseOrchestrator {
    /// Create an orchestrator that owns a small runtime for its run tasks
    pub fn new(config: CascadeConfig, collaborators: Collaborators) -> AppResult<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("cascade-worker")
            .enable_all()
            .build()?;
        Self::build(config, collaborators, Executor::Owned(runtime))
    }

    /// Create an orchestrator that spawns its run tasks onto an existing runtime
    pub fn with_handle(
        handle: Handle,
        config: CascadeConfig,
        collaborators: Collaborators,
    ) -> AppResult<Self> {
        config.validate()?;
        Self::build(config, collaborators, Executor::Borrowed(handle))
    }

    fn build(
        config: CascadeConfig,
        collaborators: Collaborators,
        executor: Executor,
    ) -> AppResult<Self> {
        let aggregator = ResultAggregator::new(
            collaborators.motion_history.clone(),
            collaborators.location_history.clone(),
        );
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                collaborators,
                aggregator,
                session: Mutex::new(None),
                phase: AtomicU8::new(Phase::None.ordinal()),
                gate: ProgressGate::default(),
                next_run: AtomicU64::new(0),
            }),
            executor: Mutex::new(executor),
        })
    }

    fn handle(&self) -> Option<Handle> {
        match &*self.executor.lock().unwrap_or_else(PoisonError::into_inner) {
            Executor::Owned(runtime) => Some(runtime.handle().clone()),
            Executor::Borrowed(handle) => Some(handle.clone()),
            Executor::Closed => None,
        }
    }

    /// Begin a run. Returns immediately; progress arrives through `on_progress`.
    ///
    /// While a run is active this delivers a single "already in progress"
    /// notice carrying the current phase and leaves the run untouched.
    pub fn start<F>(&self, on_progress: F)
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        let on_progress: ProgressCallback = Arc::new(on_progress);

        let Some(handle) = self.handle() else {
            warn!("start() called on a closed orchestrator");
            on_progress(ProgressEvent::failed(CONTEXT_UNAVAILABLE, Phase::None));
            return;
        };

        let mut guard = self.shared.session();
        if let Some(active) = guard.as_ref() {
            let phase = active.phase;
            drop(guard);
            info!(phase = %phase, "Analysis already in progress");
            on_progress(ProgressEvent::notice(ALREADY_IN_PROGRESS, phase));
            return;
        }

        let run_id = self.shared.next_run.fetch_add(1, Ordering::SeqCst) + 1;
        let mut session = AnalysisSession::new(run_id);
        let run = RunContext {
            shared: self.shared.clone(),
            run_id,
            session_id: session.id,
            cancel: session.cancel.clone(),
            on_progress,
        };

        info!(session_id = %session.id, "Starting sensing cascade");
        self.shared.set_phase(Phase::Motion);
        session.task = Some(handle.spawn(run.drive()));
        *guard = Some(session);
    }

    /// Cancel the active run, if any. No progress event of that run is
    /// delivered once this returns.
    pub fn stop(&self) {
        let stopped = {
            let mut guard = self.shared.session();
            let session = guard.take();
            self.shared.set_phase(Phase::None);
            session.map(|session| {
                let id = session.id;
                session.shutdown();
                id
            })
        };

        // Wait out a delivery already running on another thread.
        self.shared.gate.quiesce();

        if let Some(session_id) = stopped {
            info!(session_id = %session_id, "Sensing cascade stopped");
        }
    }

    /// Current phase; `Phase::None` when no run is active
    pub fn current_phase(&self) -> Phase {
        self.shared.phase()
    }

    pub fn is_running(&self) -> bool {
        self.shared.session().is_some()
    }

    /// Stop any run and release the execution context. Idempotent.
    pub fn close(&self) {
        self.stop();
        let executor = std::mem::replace(
            &mut *self.executor.lock().unwrap_or_else(PoisonError::into_inner),
            Executor::Closed,
        );
        match executor {
            Executor::Owned(runtime) => {
                runtime.shutdown_background();
                info!("Orchestrator closed");
            }
            Executor::Borrowed(_) => info!("Orchestrator closed"),
            Executor::Closed => {}
        }
    }

    /// Ask collaborators to drop their caches. The run is not affected.
    pub fn on_memory_pressure(&self, level: MemoryPressure) {
        info!(?level, phase = %self.current_phase(), "Memory pressure, trimming caches");
        let collaborators = &self.shared.collaborators;
        collaborators.sources.trim_caches(level);
        collaborators.scanner.trim_caches(level);
        collaborators.fusion.trim_caches(level);
    }
}

impl Drop for PhaseOrchestrator {
    fn drop(&mut self) {
        self.close();
    }
}

#[must_use]
enum Flow {
    Next,
    Halt,
}

/// State owned by one run task
struct RunContext {
    shared: Arc<Shared>,
    run_id: u64,
    session_id: Uuid,
    cancel: CancellationToken,
    on_progress: ProgressCallback,
}

impl RunContext {
    async fn drive(self) {
        if let Flow::Halt = self.run_motion().await {
            return;
        }
        if let Flow::Halt = self.run_location().await {
            return;
        }
        if let Flow::Halt = self.run_fusion().await {
            return;
        }
        self.complete().await;
    }

    /// Run `f` against this run's session. `None` once the run was cancelled
    /// or replaced.
    fn with_session<R>(&self, f: impl FnOnce(&mut AnalysisSession) -> R) -> Option<R> {
        let mut guard = self.shared.session();
        match guard.as_mut() {
            Some(session) if session.run_id == self.run_id && !self.cancel.is_cancelled() => {
                Some(f(session))
            }
            _ => None,
        }
    }

    fn enter(&self, phase: Phase) -> Flow {
        let entered = self.with_session(|session| {
            session.phase = phase;
            self.shared.set_phase(phase);
        });
        match entered {
            Some(()) => {
                info!(session_id = %self.session_id, phase = %phase, "Phase entered");
                Flow::Next
            }
            None => Flow::Halt,
        }
    }

    fn emit(&self, event: ProgressEvent) -> Flow {
        if self.shared.gate.deliver(&self.cancel, &self.on_progress, event, || true) {
            Flow::Next
        } else {
            Flow::Halt
        }
    }

    /// Release the held resource under the session lock
    fn release(&self) -> Flow {
        let released = self.with_session(|session| {
            let resource = session.release();
            debug!(session_id = %self.session_id, resource = resource.kind(), "Releasing resource");
            drop(resource);
        });
        match released {
            Some(()) => Flow::Next,
            None => Flow::Halt,
        }
    }

    fn host_available(&self) -> Flow {
        if self.shared.collaborators.host.is_available() {
            return Flow::Next;
        }
        warn!(session_id = %self.session_id, "Host context unavailable, aborting run");
        self.finish(ProgressEvent::failed(CONTEXT_UNAVAILABLE, Phase::None));
        Flow::Halt
    }

    fn fail(&self, phase: Phase, step: &str, err: &CoreError) -> Flow {
        warn!(session_id = %self.session_id, phase = %phase, error = %err, "Phase failed");
        self.finish(ProgressEvent::failed(format!("Error in {}: {}", step, err), phase));
        Flow::Halt
    }

    /// Tear the run down, then deliver its last event. The callback sees no
    /// active run, so it may read `Phase::None` or start the next one.
    fn finish(&self, event: ProgressEvent) -> bool {
        self.shared
            .gate
            .deliver_final(&self.cancel, &self.on_progress, event, || self.teardown())
    }

    /// End this run: clear the session, release its resource, phase → `None`.
    /// Returns false when the run no longer owns the session.
    fn teardown(&self) -> bool {
        let mut guard = self.shared.session();
        if !matches!(guard.as_ref(), Some(session) if session.run_id == self.run_id) {
            return false;
        }
        match guard.take() {
            Some(session) => {
                self.shared.set_phase(Phase::None);
                session.shutdown();
                true
            }
            None => false,
        }
    }

    /// Run a blocking history read off the async workers. `None` once the
    /// run was cancelled.
    async fn read_history<T, F>(&self, read: F) -> Option<CoreResult<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(read);
        let joined = tokio::select! {
            _ = self.cancel.cancelled() => return None,
            joined = task => joined,
        };
        Some(joined.map_err(|e| CoreError::internal(format!("history read failed: {}", e))))
    }

    async fn run_motion(&self) -> Flow {
        if let Flow::Halt = self.host_available() {
            return Flow::Halt;
        }
        if let Flow::Halt = self.emit(ProgressEvent::update(MOTION_STARTED, Phase::Motion)) {
            return Flow::Halt;
        }

        let shared = Arc::downgrade(&self.shared);
        let cancel = self.cancel.clone();
        let on_progress = self.on_progress.clone();
        let sink: SampleSink = Arc::new(move |motions: &[String]| {
            if let Some(shared) = shared.upgrade() {
                shared.forward_samples(&cancel, &on_progress, motions);
            }
        });

        let acquired = self.with_session(|session| -> CoreResult<()> {
            drop(session.release());
            let source = self.shared.collaborators.sources.acquire_motion()?;
            session.hold(HeldResource::Motion(MotionLease::start(source, sink)));
            Ok(())
        });
        match acquired {
            None => return Flow::Halt,
            Some(Err(err)) => return self.fail(Phase::Motion, "motion analysis", &err),
            Some(Ok(())) => {}
        }

        let duration = self.shared.config.motion_duration();
        debug!(
            session_id = %self.session_id,
            duration_ms = duration.as_millis() as u64,
            "Motion sampling"
        );
        tokio::select! {
            _ = self.cancel.cancelled() => return Flow::Halt,
            _ = tokio::time::sleep(duration) => {}
        }

        self.release()
    }

    async fn run_location(&self) -> Flow {
        if let Flow::Halt = self.host_available() {
            return Flow::Halt;
        }
        if let Flow::Halt = self.enter(Phase::Location) {
            return Flow::Halt;
        }
        if let Flow::Halt = self.emit(ProgressEvent::update(LOCATION_STARTED, Phase::Location)) {
            return Flow::Halt;
        }

        let acquired = self.with_session(|session| -> CoreResult<Arc<dyn LocationSource>> {
            drop(session.release());
            let source = self.shared.collaborators.sources.acquire_location()?;
            let lease = LocationLease::new(source);
            let source = lease.source();
            session.hold(HeldResource::Location(lease));
            Ok(source)
        });
        let source = match acquired {
            None => return Flow::Halt,
            Some(Err(err)) => return self.fail(Phase::Location, "location analysis", &err),
            Some(Ok(source)) => source,
        };

        let scanner = self.shared.collaborators.scanner.clone();
        let session_id = self.session_id;
        let round_trip = async move {
            let networks = scanner.scan().await?;
            debug!(session_id = %session_id, count = networks.len(), "Networks scanned");
            source.analyze(&networks).await
        };

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => return Flow::Halt,
            outcome = round_trip => outcome,
        };

        match outcome {
            Ok(analysis) => {
                debug!(
                    session_id = %self.session_id,
                    chars = analysis.len(),
                    "Location analysis finished"
                );
                Flow::Next
            }
            Err(err) => self.fail(Phase::Location, "location analysis", &err),
        }
    }

    async fn run_fusion(&self) -> Flow {
        if let Flow::Halt = self.host_available() {
            return Flow::Halt;
        }
        if let Flow::Halt = self.enter(Phase::Fusion) {
            return Flow::Halt;
        }
        if let Flow::Halt = self.emit(ProgressEvent::update(FUSION_STARTED, Phase::Fusion)) {
            return Flow::Halt;
        }
        if let Flow::Halt = self.release() {
            return Flow::Halt;
        }

        let collaborators = &self.shared.collaborators;
        let motion = collaborators.motion_history.clone();
        let location = collaborators.location_history.clone();
        let max_chars = self.shared.config.fusion_history_chars;
        let gathered = self
            .read_history(move || {
                FusionInput::gather(motion.as_ref(), location.as_ref(), max_chars)
            })
            .await;
        let input = match gathered {
            None => return Flow::Halt,
            Some(Err(err)) => return self.fail(Phase::Fusion, "context fusion", &err),
            Some(Ok(input)) => input,
        };
        debug!(
            session_id = %self.session_id,
            motion = %input.motion,
            location = %input.location,
            "Fusion input"
        );

        let fusion = collaborators.fusion.clone();
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => return Flow::Halt,
            outcome = fusion.fuse(&input.motion, &input.location) => outcome,
        };

        match outcome {
            Ok(summary) => self.emit(ProgressEvent::update(summary, Phase::Fusion)),
            Err(err) => self.fail(Phase::Fusion, "context fusion", &err),
        }
    }

    async fn complete(&self) {
        if let Flow::Halt = self.host_available() {
            return;
        }
        if let Flow::Halt = self.enter(Phase::Complete) {
            return;
        }

        let aggregator = self.shared.aggregator.clone();
        let result = match self.read_history(move || aggregator.aggregate()).await {
            None => return,
            Some(Err(err)) => {
                let _ = self.fail(Phase::Complete, "result aggregation", &err);
                return;
            }
            Some(Ok(result)) => result,
        };
        if self.finish(ProgressEvent::completed(result.render())) {
            info!(session_id = %self.session_id, "Sensing cascade complete");
        }
    }
}
