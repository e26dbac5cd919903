//! Request outcome types — the single coherent result of one request.
//!
//! The caller never sees partial-plugin state; whatever happened inside
//! the loop is condensed into one `RequestOutcome` whose `plugins_used`
//! is always consistent with the iteration log.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::Action;
use crate::plugin::PluginResult;

/// One entry in the append-only iteration log: the action the model
/// emitted on that pass and, for plugin rounds, the result that was fed
/// back before the next model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    /// Position in the log, assigned at append time.
    pub index: usize,

    /// The action the model emitted.
    pub action: Action,

    /// The plugin result folded back into context, if this pass
    /// dispatched (or synthesized) one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PluginResult>,
}

/// A single successful plugin invocation, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginUse {
    pub id: String,
    pub reason: String,
    pub input: Map<String, Value>,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// The model produced a final user-facing message.
    Message,
    /// The iteration bound was hit — a designed safety stop.
    MaxIterations,
    /// The model service failed, output stayed unparseable past the retry
    /// ceiling, or the request was cancelled.
    FatalError,
}

/// The final, caller-facing result of one orchestrated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub success: bool,
    pub response_text: String,
    pub markdown: bool,
    pub plugins_used: Vec<PluginUse>,
    pub iteration_count: usize,
    pub request_id: String,
    pub terminal_reason: TerminalReason,
}
