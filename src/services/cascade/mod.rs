//! Sensing cascade orchestration

pub mod aggregator;
mod delivery;
pub mod fusion_input;
pub mod orchestrator;
mod session;

pub use aggregator::{CombinedResult, ResultAggregator, NO_LOCATION_RESULTS, NO_MOTION_RESULTS};
pub use fusion_input::{tail_chars, FusionInput, NO_LOCATION_DATA, NO_MOTION_DATA};
pub use orchestrator::{
    Collaborators, PhaseOrchestrator, ProgressCallback, ALREADY_IN_PROGRESS, CONTEXT_UNAVAILABLE,
    FUSION_STARTED, LOCATION_STARTED, MOTION_STARTED,
};
