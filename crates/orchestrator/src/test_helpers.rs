//! Shared test helpers for controller tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use libreassistant_core::{ModelClient, ModelError, Plugin, PluginError, TurnRequest};

/// A scripted model client that returns a fixed sequence of raw outputs.
///
/// Every prompt it receives is captured for inspection, which is how the
/// tests verify the feedback invariant. Panics if more calls are made
/// than responses were provided.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Arc<Mutex<Vec<String>>>,
    failure: Option<String>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// A model whose every call fails with a network error.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            prompts: Arc::new(Mutex::new(Vec::new())),
            failure: Some(message.to_string()),
        }
    }

    /// Handle to the captured prompts, one per model call.
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
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

        if let Some(message) = &self.failure {
            return Err(ModelError::Network(message.clone()));
        }

        let mut queue = self.responses.lock().unwrap();
        match queue.pop_front() {
            Some(response) => Ok(response),
            None => panic!("ScriptedModel: no more responses"),
        }
    }
}

/// Render a terminal message action as raw model output.
pub fn message_json(text: &str, markdown: bool) -> String {
    serde_json::json!({
        "action": "message",
        "content": {"text": text, "markdown": markdown}
    })
    .to_string()
}

/// Render a plugin invocation action as raw model output.
pub fn invoke_json(plugin: &str, input: Value, reason: &str) -> String {
    serde_json::json!({
        "action": "plugin_invoke",
        "content": {"plugin": plugin, "input": input, "reason": reason}
    })
    .to_string()
}

/// A plugin that echoes its input back, for loop tests.
#[derive(Default)]
pub struct EchoPlugin;

#[async_trait]
impl Plugin for EchoPlugin {
    fn id(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echoes back the input"
    }
    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }
    fn input_example(&self) -> Value {
        serde_json::json!({"text": "hello"})
    }
    async fn execute(&self, input: Map<String, Value>) -> Result<Value, PluginError> {
        Ok(Value::Object(input))
    }
}
