//! System-instruction builder — tells the model how to drive the loop.
//!
//! The iteration controller depends on an external contract: the system
//! instructions must state the mandatory JSON response format and
//! enumerate every registered plugin with a description and at least one
//! example invocation. Without that, the parser's assumptions do not hold
//! in practice. Building the instructions from the same registry the
//! controller dispatches against is what keeps the two sides honest.

use serde_json::json;

use libreassistant_core::PluginDescriptor;

/// Build the system instructions for a registry snapshot.
pub fn build_system_instructions(plugins: &[PluginDescriptor]) -> String {
    let mut out = String::with_capacity(2048);

    out.push_str(
        "You are LibreAssistant, an AI assistant with access to plugins for \
enhanced capabilities.\n\n\
You MUST respond with exactly one JSON object for EVERY response. No prose \
outside the JSON object.\n\n\
1. For a final user-facing message:\n\
{\n\
  \"action\": \"message\",\n\
  \"content\": {\n\
    \"text\": \"Your response text here\",\n\
    \"markdown\": false\n\
  }\n\
}\n\n\
2. To invoke a plugin:\n\
{\n\
  \"action\": \"plugin_invoke\",\n\
  \"content\": {\n\
    \"plugin\": \"plugin_id\",\n\
    \"input\": { \"your\": \"plugin_input\" },\n\
    \"reason\": \"Why you are calling this plugin\"\n\
  }\n\
}\n\n\
AVAILABLE PLUGINS:",
    );

    if plugins.is_empty() {
        out.push_str("\nNo plugins are currently available.\n");
    } else {
        for plugin in plugins {
            let example = json!({
                "action": "plugin_invoke",
                "content": {
                    "plugin": plugin.id,
                    "input": plugin.input_example,
                    "reason": "..."
                }
            });
            out.push_str(&format!(
                "\n\n--- {} ---\nDescription: {}\nExample invocation:\n{}",
                plugin.id,
                plugin.description,
                serde_json::to_string_pretty(&example).unwrap_or_default(),
            ));
        }
        out.push('\n');
    }

    out.push_str(
        "\nGUIDELINES:\n\
1. Invoke a plugin when it can improve your answer with real data.\n\
2. Always give a specific reason when invoking a plugin.\n\
3. Format plugin inputs exactly as the examples show.\n\
4. After receiving a plugin result, either invoke another plugin or \
respond to the user with a final message.\n\
5. Never respond in plain text — always the JSON format above.\n",
    );

    out
}
