//! End-to-end loop scenarios against scripted model output.
//!
//! These tests drive the full controller → parser → executor → assembler
//! cycle with real plugins and a scripted model client, covering the
//! termination, feedback, and outcome-consistency guarantees.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use libreassistant_core::{
    EventBus, ModelClient, ModelError, Plugin, PluginError, PluginRegistry, PluginRegistryBuilder,
    TerminalReason, TurnRequest,
};
use libreassistant_orchestrator::{ApiResponse, IterationController};
use libreassistant_plugins::web_search::WebSearchPlugin;

// ── Scripted model ────────────────────────────────────────────────────────

struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        self.prompts.clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send_turn(&self, request: TurnRequest) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let mut queue = self.responses.lock().unwrap();
        match queue.pop_front() {
            Some(response) => Ok(response),
            None => panic!("ScriptedModel: no more responses"),
        }
    }
}

fn message_json(text: &str, markdown: bool) -> String {
    serde_json::json!({
        "action": "message",
        "content": {"text": text, "markdown": markdown}
    })
    .to_string()
}

fn invoke_json(plugin: &str, input: Value, reason: &str) -> String {
    serde_json::json!({
        "action": "plugin_invoke",
        "content": {"plugin": plugin, "input": input, "reason": reason}
    })
    .to_string()
}

// ── Inline plugins for failure-path tests ─────────────────────────────────

struct FailingPlugin;

#[async_trait]
impl Plugin for FailingPlugin {
    fn id(&self) -> &str {
        "failing"
    }
    fn description(&self) -> &str {
        "always fails"
    }
    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }
    fn input_example(&self) -> Value {
        serde_json::json!({})
    }
    async fn execute(&self, _input: Map<String, Value>) -> Result<Value, PluginError> {
        Err(PluginError::ExecutionFailed {
            plugin_id: "failing".into(),
            reason: "downstream service returned 500".into(),
        })
    }
}

struct SleepyPlugin;

#[async_trait]
impl Plugin for SleepyPlugin {
    fn id(&self) -> &str {
        "sleepy"
    }
    fn description(&self) -> &str {
        "never finishes in time"
    }
    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }
    fn input_example(&self) -> Value {
        serde_json::json!({})
    }
    async fn execute(&self, _input: Map<String, Value>) -> Result<Value, PluginError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Value::Null)
    }
}

// ── Harness ───────────────────────────────────────────────────────────────

fn search_registry() -> PluginRegistry {
    PluginRegistryBuilder::new()
        .register(Arc::new(WebSearchPlugin))
        .build()
}

fn controller(model: ScriptedModel, registry: PluginRegistry) -> IterationController {
    IterationController::new(
        Arc::new(model),
        "mock-model",
        0.7,
        Arc::new(registry),
        Arc::new(EventBus::default()),
    )
}

// ── Scenario A: immediate final message ───────────────────────────────────

#[tokio::test]
async fn scenario_a_immediate_message() {
    let model = ScriptedModel::new(vec![message_json("Hello", false)]);
    let ctl = controller(model, search_registry());

    let outcome = ctl.run("req-a", "Say hello").await;
    let api = ApiResponse::from(&outcome);

    assert!(api.success);
    assert_eq!(api.response, "Hello");
    assert_eq!(api.plugin_count, 0);
    assert!(api.plugins_used.is_empty());
    assert_eq!(api.request_id, "req-a");
}

// ── Scenario B: one plugin round, then a final message ────────────────────

#[tokio::test]
async fn scenario_b_search_then_message() {
    let model = ScriptedModel::new(vec![
        invoke_json("web-search", serde_json::json!({"query": "x"}), "need data"),
        message_json("Found: results attached.", true),
    ]);
    let ctl = controller(model, search_registry());

    let outcome = ctl.run("req-b", "search for x").await;

    assert!(outcome.success);
    assert!(outcome.markdown);
    assert_eq!(outcome.iteration_count, 1);
    assert_eq!(outcome.plugins_used.len(), 1);
    assert_eq!(outcome.plugins_used[0].id, "web-search");
    assert_eq!(outcome.plugins_used[0].reason, "need data");
    assert_eq!(outcome.plugins_used[0].input["query"], "x");
}

// ── Scenario C: unknown plugin, then recovery ─────────────────────────────

#[tokio::test]
async fn scenario_c_unknown_plugin_then_recovery() {
    let model = ScriptedModel::new(vec![
        invoke_json("nonexistent", serde_json::json!({"q": "x"}), "oops"),
        invoke_json("web-search", serde_json::json!({"query": "x"}), "retry"),
        message_json("Done.", false),
    ]);
    let prompts = model.prompts();
    let ctl = controller(model, search_registry());

    let outcome = ctl.run("req-c", "task").await;

    assert!(outcome.success);
    // The failed attempt consumed exactly one iteration, the valid one a second
    assert_eq!(outcome.iteration_count, 2);
    assert_eq!(outcome.plugins_used.len(), 1);
    assert_eq!(outcome.plugins_used[0].id, "web-search");

    // The model was told, in the same round, that its plugin does not exist
    let seen = prompts.lock().unwrap();
    assert!(seen[1].contains("unknown plugin 'nonexistent'"));
}

// ── Scenario D: iteration bound ───────────────────────────────────────────

#[tokio::test]
async fn scenario_d_bound_stops_sixth_round() {
    // Six plugin requests in a row, each with distinct input.
    let mut responses: Vec<String> = (0..6)
        .map(|i| {
            invoke_json(
                "web-search",
                serde_json::json!({"query": format!("step {i}")}),
                "chaining",
            )
        })
        .collect();
    responses.push(message_json("never reached", false));

    let model = ScriptedModel::new(responses);
    let prompts = model.prompts();
    let ctl = controller(model, search_registry()).with_max_iterations(5);

    let outcome = ctl.run("req-d", "keep searching").await;

    assert!(!outcome.success);
    assert_eq!(outcome.terminal_reason, TerminalReason::MaxIterations);
    assert_eq!(outcome.iteration_count, 5);
    assert_eq!(outcome.plugins_used.len(), 5);
    // The abort explanation names the plugin work that already happened
    assert!(outcome.response_text.contains("web-search"));
    // 5 executed rounds plus the pass that hit the bound
    assert_eq!(prompts.lock().unwrap().len(), 6);
}

// ── Scenario E: unparseable output every turn ─────────────────────────────

#[tokio::test]
async fn scenario_e_unparseable_output_aborts() {
    let model = ScriptedModel::new(vec![
        "complete nonsense".into(),
        "still not JSON".into(),
        "why would this ever parse".into(),
    ]);
    let prompts = model.prompts();
    let ctl = controller(model, search_registry()).with_parse_retry_limit(2);

    let outcome = ctl.run("req-e", "task").await;

    assert!(!outcome.success);
    assert_eq!(outcome.terminal_reason, TerminalReason::FatalError);
    assert_eq!(outcome.iteration_count, 0);
    // 1 initial call + 2 bounded retries
    assert_eq!(prompts.lock().unwrap().len(), 3);
    // The re-prompt told the model what to fix
    assert!(prompts.lock().unwrap()[1].contains("exactly one JSON object"));
}

// ── Feedback invariant ────────────────────────────────────────────────────

#[tokio::test]
async fn feedback_invariant_result_precedes_next_call() {
    let model = ScriptedModel::new(vec![
        invoke_json(
            "web-search",
            serde_json::json!({"query": "rust language"}),
            "lookup",
        ),
        message_json("ok", false),
    ]);
    let prompts = model.prompts();
    let ctl = controller(model, search_registry());

    ctl.run("req-f", "task").await;

    let seen = prompts.lock().unwrap();
    assert_eq!(seen.len(), 2);
    // The very next model call's context contains the round's result...
    assert!(seen[1].contains("Plugin \"web-search\" returned"));
    // ...including the plugin's actual output
    assert!(seen[1].contains("doc.rust-lang.org"));
    // ...and the model's own action in its history
    assert!(seen[1].contains("plugin_invoke"));
}

// ── Outcome consistency ───────────────────────────────────────────────────

#[tokio::test]
async fn outcome_consistency_failed_rounds_excluded() {
    let registry = PluginRegistryBuilder::new()
        .register(Arc::new(WebSearchPlugin))
        .register(Arc::new(FailingPlugin))
        .build();

    let model = ScriptedModel::new(vec![
        invoke_json("failing", serde_json::json!({"a": 1}), "first try"),
        invoke_json("web-search", serde_json::json!({"query": "x"}), "fallback"),
        message_json("Recovered via search.", false),
    ]);
    let prompts = model.prompts();
    let ctl = controller(model, registry);

    let outcome = ctl.run("req-g", "task").await;

    assert!(outcome.success);
    assert_eq!(outcome.iteration_count, 2);
    // Only the successful invocation is reported
    assert_eq!(outcome.plugins_used.len(), 1);
    assert_eq!(outcome.plugins_used[0].id, "web-search");
    // The failure was still fed back to the model as data
    assert!(prompts.lock().unwrap()[1].contains("downstream service returned 500"));
}

// ── Timeout handling ──────────────────────────────────────────────────────

#[tokio::test]
async fn timed_out_plugin_is_a_failed_round_not_a_fault() {
    let registry = PluginRegistryBuilder::new()
        .register(Arc::new(SleepyPlugin))
        .build();

    let model = ScriptedModel::new(vec![
        invoke_json("sleepy", serde_json::json!({}), "slow call"),
        message_json("Gave up on the slow plugin.", false),
    ]);
    let prompts = model.prompts();
    let ctl = controller(model, registry).with_plugin_timeout(Duration::from_millis(50));

    let outcome = ctl.run("req-h", "task").await;

    assert!(outcome.success);
    assert_eq!(outcome.iteration_count, 1);
    assert!(outcome.plugins_used.is_empty());
    assert!(prompts.lock().unwrap()[1].contains("timed out"));
}

// ── Consecutive duplicate suppression ─────────────────────────────────────

#[tokio::test]
async fn consecutive_duplicate_is_not_reexecuted() {
    let same_input = serde_json::json!({"query": "identical"});
    let model = ScriptedModel::new(vec![
        invoke_json("web-search", same_input.clone(), "first"),
        invoke_json("web-search", same_input, "again"),
        message_json("ok", false),
    ]);
    let prompts = model.prompts();
    let ctl = controller(model, search_registry());

    let outcome = ctl.run("req-i", "task").await;

    assert!(outcome.success);
    // Both rounds count against the bound...
    assert_eq!(outcome.iteration_count, 2);
    // ...but only the first actually executed
    assert_eq!(outcome.plugins_used.len(), 1);
    assert!(prompts.lock().unwrap()[2].contains("duplicate invocation"));
}

// ── Full stack through the default registry ───────────────────────────────

#[tokio::test]
async fn file_write_then_read_chain() {
    let dir = tempfile::tempdir().unwrap();
    let registry = libreassistant_plugins::default_registry(dir.path());

    let model = ScriptedModel::new(vec![
        invoke_json(
            "file-io",
            serde_json::json!({"operation": "write", "path": "notes.txt", "content": "remember this"}),
            "save the note",
        ),
        invoke_json(
            "file-io",
            serde_json::json!({"operation": "read", "path": "notes.txt"}),
            "read it back",
        ),
        message_json("Your note says: remember this", false),
    ]);
    let prompts = model.prompts();
    let ctl = controller(model, registry);

    let outcome = ctl.run("req-j", "write then read a note").await;

    assert!(outcome.success);
    assert_eq!(outcome.plugins_used.len(), 2);
    assert_eq!(outcome.plugins_used[0].id, "file-io");
    // The read round saw the content written in the first round
    assert!(prompts.lock().unwrap()[2].contains("remember this"));
    // And the file really exists on disk
    assert_eq!(
        std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
        "remember this"
    );
}
