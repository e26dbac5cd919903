//! Per-request plugin usage log.
//!
//! One ordered entry per invocation attempt — dispatched, unknown, or
//! suppressed as a duplicate — with the result filled in after execution.
//! The log is owned by a single request loop, so unlike a process-global
//! tracker it needs no locking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// A single plugin invocation attempt with detailed metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PluginInvocation {
    pub plugin_id: String,
    pub reason: String,
    pub input: Map<String, Value>,
    /// Order within the request, assigned at record time.
    pub invocation_index: usize,
    pub timestamp: DateTime<Utc>,
    /// Set after execution.
    pub success: Option<bool>,
    pub error: Option<String>,
    pub duration_ms: Option<u64>,
}

/// The append-only invocation log for one request.
#[derive(Debug, Default)]
pub struct UsageLog {
    invocations: Vec<PluginInvocation>,
}

impl UsageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an invocation attempt before execution. Returns its index.
    pub fn record(
        &mut self,
        plugin_id: impl Into<String>,
        input: Map<String, Value>,
        reason: impl Into<String>,
    ) -> usize {
        let index = self.invocations.len();
        self.invocations.push(PluginInvocation {
            plugin_id: plugin_id.into(),
            reason: reason.into(),
            input,
            invocation_index: index,
            timestamp: Utc::now(),
            success: None,
            error: None,
            duration_ms: None,
        });
        index
    }

    /// Fill in the result of a recorded invocation.
    pub fn finish(&mut self, index: usize, success: bool, error: Option<String>, duration_ms: u64) {
        if let Some(invocation) = self.invocations.get_mut(index) {
            invocation.success = Some(success);
            invocation.error = error;
            invocation.duration_ms = Some(duration_ms);
        }
    }

    /// Whether this would repeat the immediately preceding invocation
    /// (same plugin, same input).
    pub fn is_consecutive_duplicate(&self, plugin_id: &str, input: &Map<String, Value>) -> bool {
        self.invocations
            .last()
            .is_some_and(|last| last.plugin_id == plugin_id && &last.input == input)
    }

    pub fn invocations(&self) -> &[PluginInvocation] {
        &self.invocations
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    /// A compact, human-readable list of what ran, for abort summaries.
    pub fn summary(&self) -> String {
        self.invocations
            .iter()
            .map(|inv| {
                let status = match inv.success {
                    Some(true) => "ok",
                    Some(false) => "failed",
                    None => "pending",
                };
                if inv.reason.is_empty() {
                    format!("{} ({status})", inv.plugin_id)
                } else {
                    format!("{} ({status}: {})", inv.plugin_id, inv.reason)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
