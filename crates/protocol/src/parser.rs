//! Action Parser — extract one structured action from raw model output.
//!
//! Models wrap their JSON in markdown fences, preface it with prose, or
//! trail it with commentary. The parser tries progressively looser
//! extraction strategies before giving up:
//!
//! 1. The whole (trimmed) text as JSON
//! 2. The body of the first markdown code fence (```json or bare ```)
//! 3. The slice from the first `{` to the last `}`
//!
//! Parsing is a pure function over its input: same text in, same
//! `Action` out, no side effects.

use serde_json::{Map, Value};
use tracing::debug;

use libreassistant_core::Action;

/// Parse one turn of raw model output into an [`Action`].
///
/// Never fails in the `Result` sense: output that cannot be interpreted
/// becomes `Action::ParseError` carrying the raw text and the reason, so
/// the iteration controller can decide to re-prompt.
pub fn parse(raw: &str) -> Action {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return parse_error(raw, "model returned empty output");
    }

    for candidate in candidates(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return interpret(value, raw);
        }
    }

    parse_error(raw, "no JSON object found in model output")
}

/// Candidate JSON slices, strictest first.
fn candidates(trimmed: &str) -> Vec<&str> {
    let mut out = vec![trimmed];

    if let Some(fenced) = fenced_block(trimmed) {
        out.push(fenced);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            out.push(&trimmed[start..=end]);
        }
    }

    out
}

/// The body of the first ``` fence, with an optional language tag stripped.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    // Skip the language tag line ("json", "JSON", or nothing)
    let body = match after.find('\n') {
        Some(nl) if after[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &after[nl + 1..]
        }
        _ => after,
    };
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Interpret a parsed JSON value as an action.
fn interpret(value: Value, raw: &str) -> Action {
    let Some(obj) = value.as_object() else {
        return parse_error(raw, "model output is JSON but not an object");
    };

    let Some(discriminant) = obj.get("action").and_then(Value::as_str) else {
        return parse_error(raw, "missing or non-string 'action' field");
    };

    let content = obj
        .get("content")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    match discriminant {
        "plugin_invoke" => interpret_plugin_invoke(&content, raw),
        "message" => interpret_message(&content, raw),
        other => parse_error(raw, format!("unknown action '{other}'")),
    }
}

fn interpret_plugin_invoke(content: &Map<String, Value>, raw: &str) -> Action {
    let plugin = match content.get("plugin").and_then(Value::as_str) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => return parse_error(raw, "plugin invocation missing 'content.plugin'"),
    };

    let input = match content.get("input") {
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return parse_error(raw, "plugin invocation 'content.input' is not an object"),
        None => return parse_error(raw, "plugin invocation missing 'content.input'"),
    };

    // The original protocol treats reason as optional; an absent reason
    // must not fail the whole invocation.
    let reason = content
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    debug!(plugin = %plugin, "Parsed plugin invocation");
    Action::PluginInvoke {
        plugin,
        input,
        reason,
    }
}

fn interpret_message(content: &Map<String, Value>, raw: &str) -> Action {
    let Some(text) = content.get("text").and_then(Value::as_str) else {
        return parse_error(raw, "message missing 'content.text'");
    };

    let markdown = content
        .get("markdown")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Action::Message {
        text: text.to_string(),
        markdown,
    }
}

fn parse_error(raw: &str, reason: impl Into<String>) -> Action {
    let reason = reason.into();
    debug!(reason = %reason, "Model output failed to parse");
    Action::ParseError {
        raw: raw.to_string(),
        reason,
    }
}
