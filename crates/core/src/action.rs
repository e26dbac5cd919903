//! The action protocol — the structured intent the model emits each turn.
//!
//! The model is instructed (see `libreassistant-protocol`) to answer every
//! turn with exactly one JSON object of the shape
//! `{"action": ..., "content": {...}}`. This module is the closed Rust
//! rendering of that protocol: one tagged enum, matched exhaustively by
//! the iteration controller. Malformed output becomes `ParseError` and is
//! carried through the loop as data — it is never silently dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One action per model turn.
///
/// The serde attributes reproduce the wire shape the model is taught:
/// the variant name lands in `action` and the fields in `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "content", rename_all = "snake_case")]
pub enum Action {
    /// A request to invoke a registered plugin.
    PluginInvoke {
        /// The plugin id, expected to match a registry entry.
        plugin: String,
        /// Free-form input payload; conformance to the plugin's declared
        /// schema is checked at execution time, not parse time.
        input: Map<String, Value>,
        /// The model's stated justification for the call.
        #[serde(default)]
        reason: String,
    },

    /// A final, user-facing message. Terminal for the request.
    Message {
        text: String,
        #[serde(default)]
        markdown: bool,
    },

    /// Model output that could not be interpreted as either of the above.
    ParseError { raw: String, reason: String },
}

impl Action {
    /// Whether this action ends the iteration loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Message { .. })
    }

    /// The plugin id, if this is a plugin invocation.
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            Action::PluginInvoke { plugin, .. } => Some(plugin),
            _ => None,
        }
    }
}
