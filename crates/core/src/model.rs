//! ModelClient trait — the abstraction over the turn-taking model service.
//!
//! A ModelClient knows how to send one fully-rendered prompt to a language
//! model backend and return the raw text of its turn. The orchestrator
//! interprets that text; the client does not.
//!
//! Implementations: Ollama `/api/generate` (in `libreassistant-providers`),
//! scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// One turn's worth of request to the model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    /// The model to use (e.g., "llama3.2").
    pub model: String,

    /// The fully-rendered prompt: system instructions + conversation.
    pub prompt: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// The core model-service trait.
///
/// `send_turn` is one of the loop's two suspension points (the other is
/// plugin execution). A failure here is the one thing the orchestrator
/// treats as fatal for the request.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// A human-readable name for this backend (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a prompt and block until the full turn of text is returned.
    async fn send_turn(&self, request: TurnRequest) -> std::result::Result<String, ModelError>;

    /// Health check — can we reach the service?
    async fn health_check(&self) -> std::result::Result<bool, ModelError> {
        Ok(true)
    }
}
