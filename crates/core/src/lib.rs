//! Sensing Cascade Core
//!
//! Foundational types for the Sensing Cascade workspace: the analysis phase
//! model, progress events, the cascade configuration, and the traits every
//! sensing collaborator implements. This crate has no dependency on a runtime,
//! an inference backend, or storage.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `phase` - Analysis phases and progress events (`Phase`, `ProgressEvent`)
//! - `config` - Externally adjustable cascade constants (`CascadeConfig`)
//! - `sources` - Collaborator contracts (`MotionSource`, `LocationSource`, `FusionStage`, ...)
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/async-trait/thiserror**
//! 2. **Trait-based collaborators** - every sensing stage can be swapped or faked in tests
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod config;
pub mod error;
pub mod phase;
pub mod sources;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Phase Model ────────────────────────────────────────────────────────
pub use phase::{Phase, ProgressEvent, ProgressKind};

// ── Configuration ──────────────────────────────────────────────────────
pub use config::{CascadeConfig, FailurePolicy};

// ── Collaborator Contracts ─────────────────────────────────────────────
pub use sources::{
    FusionStage, HistoryReader, HostContext, LocationSource, MemoryPressure, MotionSource,
    NetworkScanner, SampleSink, SourceProvider,
};
