//! Plugin Executor — run one plugin invocation safely.
//!
//! The executor's single guarantee: nothing raises past its boundary.
//! Plugin errors, timeouts, and panics in the plugin body all come back
//! as a failed `PluginResult` that the loop feeds to the model as data.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use libreassistant_core::{Plugin, PluginResult};

pub struct PluginExecutor;

impl PluginExecutor {
    /// Execute a plugin with the given input under a bounded timeout.
    pub async fn execute(
        plugin: Arc<dyn Plugin>,
        input: Map<String, Value>,
        timeout: Duration,
    ) -> PluginResult {
        let plugin_id = plugin.id().to_string();
        debug!(plugin = %plugin_id, timeout_ms = timeout.as_millis() as u64, "Dispatching plugin");

        // Run on a separate task so a panic in the plugin body becomes a
        // JoinError here instead of unwinding through the loop.
        let mut handle = tokio::spawn(async move { plugin.execute(input).await });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(output))) => PluginResult::ok(output),
            Ok(Ok(Err(e))) => {
                warn!(plugin = %plugin_id, error = %e, "Plugin execution failed");
                PluginResult::fail(e.to_string())
            }
            Ok(Err(join_err)) => {
                warn!(plugin = %plugin_id, "Plugin task crashed");
                PluginResult::fail(format!("plugin '{plugin_id}' crashed: {join_err}"))
            }
            Err(_elapsed) => {
                handle.abort();
                warn!(plugin = %plugin_id, "Plugin timed out");
                PluginResult::fail(format!(
                    "plugin '{plugin_id}' timed out after {}ms",
                    timeout.as_millis()
                ))
            }
        }
    }
}
