//! Model service clients for LibreAssistant.
//!
//! All clients implement the `libreassistant_core::ModelClient` trait.
//! The orchestrator calls `send_turn` without knowing which backend is
//! behind it.

pub mod ollama;

pub use ollama::OllamaClient;
