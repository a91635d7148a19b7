//! Services
//!
//! Business logic: the cascade orchestrator and the device adapters it drives.

pub mod cascade;
pub mod sensing;
