//! Sensing Cascade
//!
//! Runs a fixed motion → location → fusion analysis on one device, one run at
//! a time, holding at most one sensing resource at any instant.
//! It includes:
//! - The phase orchestrator and result aggregation (`services::cascade`)
//! - Device adapters: synthetic motion, Wi-Fi scanning, LLM-backed analysis
//! - Storage for configuration and sensing history
//! - The `sensing-cascade` command-line interface

pub mod cli;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::{AppConfig, FusionMode, SettingsUpdate};
pub use services::cascade::{Collaborators, CombinedResult, PhaseOrchestrator, ResultAggregator};
pub use services::sensing::SensingStack;
pub use utils::error::{AppError, AppResult};

pub use sensing_cascade_core::{CascadeConfig, MemoryPressure, Phase, ProgressEvent, ProgressKind};
