//! Data Models
//!
//! Configuration structures persisted by the application.

pub mod settings;

pub use settings::*;
