//! Storage Layer
//!
//! Handles all data persistence: JSON config and the sensing history files.

pub mod config;
pub mod history;

pub use config::*;
pub use history::*;
