//! Response Formatter — condense a finished loop into one outcome.
//!
//! On a final message the model's text is copied verbatim. On an abort
//! the formatter synthesizes an explanation from the iteration log, so
//! the caller never gets a bare error when plugin work already happened.

use serde::{Deserialize, Serialize};

use libreassistant_core::{
    Action, IterationRecord, PluginUse, RequestOutcome, TerminalReason,
};

/// The stable caller-facing wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub response: String,
    pub markdown: bool,
    pub plugin_count: usize,
    pub plugins_used: Vec<PluginUse>,
    pub request_id: String,
}

impl From<&RequestOutcome> for ApiResponse {
    fn from(outcome: &RequestOutcome) -> Self {
        Self {
            success: outcome.success,
            response: outcome.response_text.clone(),
            markdown: outcome.markdown,
            plugin_count: outcome.plugins_used.len(),
            plugins_used: outcome.plugins_used.clone(),
            request_id: outcome.request_id.clone(),
        }
    }
}

/// The successful `PluginInvoke` entries of the iteration log, in order.
pub fn plugins_used(records: &[IterationRecord]) -> Vec<PluginUse> {
    records
        .iter()
        .filter(|r| r.result.as_ref().is_some_and(|res| res.success))
        .filter_map(|r| match &r.action {
            Action::PluginInvoke {
                plugin,
                input,
                reason,
            } => Some(PluginUse {
                id: plugin.clone(),
                reason: reason.clone(),
                input: input.clone(),
            }),
            _ => None,
        })
        .collect()
}

fn iteration_count(records: &[IterationRecord]) -> usize {
    records.iter().filter(|r| r.result.is_some()).count()
}

/// Outcome for a terminal model message.
pub fn message_outcome(
    request_id: &str,
    records: &[IterationRecord],
    text: String,
    markdown: bool,
) -> RequestOutcome {
    RequestOutcome {
        success: true,
        response_text: text,
        markdown,
        plugins_used: plugins_used(records),
        iteration_count: iteration_count(records),
        request_id: request_id.to_string(),
        terminal_reason: TerminalReason::Message,
    }
}

/// Outcome for an aborted loop (iteration bound, parse ceiling, fatal
/// model failure, or cancellation).
pub fn abort_outcome(
    request_id: &str,
    records: &[IterationRecord],
    terminal_reason: TerminalReason,
    detail: String,
    last_model_text: Option<String>,
) -> RequestOutcome {
    let used = plugins_used(records);

    let mut response = detail;
    if !used.is_empty() {
        let names: Vec<String> = used
            .iter()
            .map(|u| {
                if u.reason.is_empty() {
                    u.id.clone()
                } else {
                    format!("{} ({})", u.id, u.reason)
                }
            })
            .collect();
        response.push_str(&format!(" Plugins invoked: {}.", names.join(", ")));
    } else if let Some(text) = last_model_text {
        let text = text.trim();
        if !text.is_empty() {
            response.push_str(&format!(" Last model output: {text}"));
        }
    }

    RequestOutcome {
        success: false,
        response_text: response,
        markdown: false,
        plugins_used: used,
        iteration_count: iteration_count(records),
        request_id: request_id.to_string(),
        terminal_reason,
    }
}
