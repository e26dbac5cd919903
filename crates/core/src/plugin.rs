//! Plugin trait and registry — the abstraction over external capabilities.
//!
//! Plugins are what the model can reach for beyond text generation:
//! web search, case-law lookup, file I/O. Each one sits behind the fixed
//! `Plugin` contract; the registry is built once at startup and read-only
//! afterwards, which keeps plugin identity deterministic across
//! concurrent requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::PluginError;

/// Static metadata describing a registered plugin.
///
/// Owned by the registry and immutable for the process lifetime. The
/// `input_example` is not decoration: the system instructions sent to the
/// model must show at least one example payload per plugin, or the model
/// cannot be expected to emit valid invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Unique plugin id (e.g., "web-search").
    pub id: String,

    /// One-line description sent to the model.
    pub description: String,

    /// JSON Schema describing the expected input mapping.
    pub input_schema: Value,

    /// An example input payload, shown verbatim in the system instructions.
    pub input_example: Value,
}

/// The outcome of a single plugin execution.
///
/// Exactly one of `output` and `error` is populated; the constructors
/// are the only way the orchestrator builds these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginResult {
    /// Whether the plugin executed successfully.
    pub success: bool,

    /// The plugin's output value on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    /// The failure description on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PluginResult {
    /// A successful result carrying the plugin's output.
    pub fn ok(output: Value) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    /// A failed result carrying a description of what went wrong.
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// The core Plugin trait.
///
/// Each capability (web search, case-law lookup, file I/O, ...) implements
/// this trait. Whatever side effects the plugin performs are its own
/// responsibility; the orchestrator only bounds them with a timeout.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The unique id of this plugin (e.g., "file-io").
    fn id(&self) -> &str;

    /// A description of what this plugin does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this plugin's input.
    fn input_schema(&self) -> Value;

    /// One example input payload for the system instructions.
    fn input_example(&self) -> Value;

    /// Execute the plugin with the given input mapping.
    async fn execute(&self, input: Map<String, Value>) -> std::result::Result<Value, PluginError>;

    /// Convert this plugin into its registry descriptor.
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor {
            id: self.id().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
            input_example: self.input_example(),
        }
    }
}

/// Builder for the immutable plugin registry.
///
/// Registration happens once, at process start. `build()` freezes the
/// table; there is deliberately no way to add a plugin to a built
/// registry at request time.
#[derive(Default)]
pub struct PluginRegistryBuilder {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. A later registration with the same id replaces
    /// the earlier one.
    pub fn register(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.retain(|p| p.id() != plugin.id());
        self.plugins.push(plugin);
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> PluginRegistry {
        let descriptors: Vec<PluginDescriptor> =
            self.plugins.iter().map(|p| p.descriptor()).collect();
        let index = self
            .plugins
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id().to_string(), i))
            .collect();
        PluginRegistry {
            plugins: self.plugins,
            descriptors,
            index,
        }
    }
}

/// The read-only registry of available plugins.
///
/// The iteration controller uses this to:
/// 1. Hand descriptors to the system-instruction builder
/// 2. Look up plugins when the model requests them
///
/// Shared across concurrent request loops behind an `Arc`; reads need
/// no locking because nothing mutates after `build()`.
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
    descriptors: Vec<PluginDescriptor>,
    index: HashMap<String, usize>,
}

impl PluginRegistry {
    /// An empty registry (useful in tests).
    pub fn empty() -> Self {
        PluginRegistryBuilder::new().build()
    }

    /// Look up a plugin by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.index.get(id).map(|&i| self.plugins[i].clone())
    }

    /// Look up a plugin's descriptor by id.
    pub fn descriptor(&self, id: &str) -> Option<&PluginDescriptor> {
        self.index.get(id).map(|&i| &self.descriptors[i])
    }

    /// Whether a plugin with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All descriptors, in registration order.
    pub fn list(&self) -> &[PluginDescriptor] {
        &self.descriptors
    }

    /// All registered plugin ids, in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
