//! Error types for the LibreAssistant domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all LibreAssistant operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model service errors ---
    #[error("Model service error: {0}")]
    Model(#[from] ModelError),

    // --- Plugin errors ---
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the turn-taking model service.
///
/// These are the only conditions the orchestrator treats as fatal for a
/// request; everything else is folded back into the loop as data.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from model service: {0}")]
    InvalidResponse(String),

    #[error("Model service not configured: {0}")]
    NotConfigured(String),
}

/// Failures raised by a plugin body.
///
/// The executor converts every one of these (plus timeouts and panics)
/// into a failed `PluginResult` — they never cross the loop boundary.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Invalid plugin input: {0}")]
    InvalidInput(String),

    #[error("Plugin execution failed: {plugin_id} — {reason}")]
    ExecutionFailed { plugin_id: String, reason: String },

    #[error("Permission denied: {plugin_id} — {reason}")]
    PermissionDenied { plugin_id: String, reason: String },
}
