//! Sensing Cascade LLM
//!
//! Opaque text generation for the location and fusion stages:
//! - `TextGenerator` trait every backend implements
//! - Ollama (local inference via ollama-rs)
//! - Canned offline generator for demo runs without a model server
//!
//! Also owns the prompt templates the sensing stages send.

pub mod offline;
pub mod ollama;
pub mod prompts;
pub mod provider;
pub mod types;

// Re-export main types
pub use offline::CannedGenerator;
pub use ollama::OllamaGenerator;
pub use provider::TextGenerator;
pub use types::*;
