//! Context Assembler — build the next prompt from the conversation state.
//!
//! Feedback turns are appended in the same structured shape the model was
//! taught (the action it emitted, then the plugin result), followed by an
//! explicit instruction to continue or finish. The assembler also
//! enforces the context token budget: when the turns would exceed it, the
//! oldest non-essential turns are dropped, always preserving the original
//! user request and the most recent plugin round.

use tracing::debug;

use libreassistant_core::{Action, ConversationContext, PluginResult, Role, Turn};

pub struct ContextAssembler {
    token_budget: usize,
}

impl ContextAssembler {
    pub fn new(token_budget: usize) -> Self {
        Self { token_budget }
    }

    /// Render the full prompt for the next model call.
    pub fn render(&self, system_instructions: &str, ctx: &ConversationContext) -> String {
        let mut prompt =
            String::with_capacity(system_instructions.len() + ctx.estimated_tokens() * 4 + 64);
        prompt.push_str(system_instructions);
        prompt.push_str("\n\nConversation:\n");
        for turn in &ctx.turns {
            let role = match turn.role {
                Role::User => "User",
                Role::Model => "Assistant",
                Role::System => "System",
            };
            prompt.push_str(role);
            prompt.push_str(": ");
            prompt.push_str(&turn.content);
            prompt.push('\n');
        }
        prompt.push_str("Assistant:");
        prompt
    }

    /// Fold one completed plugin round back into the context.
    ///
    /// Appends the model's own action (so it sees its valid output
    /// history) and a feedback turn carrying the result.
    pub fn append_plugin_round(
        &self,
        ctx: &mut ConversationContext,
        action: &Action,
        result: &PluginResult,
    ) {
        if let Ok(action_json) = serde_json::to_string(action) {
            ctx.push_turn(Turn::model(action_json));
        }

        let plugin_id = action.plugin_id().unwrap_or("unknown");
        let result_json =
            serde_json::to_string_pretty(result).unwrap_or_else(|_| "{\"success\": false}".into());
        ctx.push_turn(Turn::system(format!(
            "Plugin \"{plugin_id}\" returned:\n{result_json}\n\n\
Continue the task: invoke another plugin if needed, or respond to the \
user with a final message. Respond in the required JSON format."
        )));

        self.enforce_budget(ctx);
    }

    /// Record an unparseable model turn and ask for valid output.
    pub fn append_parse_retry(&self, ctx: &mut ConversationContext, raw: &str, reason: &str) {
        ctx.push_turn(Turn::model(raw.to_string()));
        ctx.push_turn(Turn::system(format!(
            "Your last response could not be interpreted ({reason}). Respond \
again with exactly one JSON object in the required format, and nothing else."
        )));

        self.enforce_budget(ctx);
    }

    /// Drop oldest non-essential turns until the context fits the budget.
    ///
    /// Turn 0 (the original user request) and the final two turns (the
    /// most recent round) are never dropped.
    fn enforce_budget(&self, ctx: &mut ConversationContext) {
        while ctx.estimated_tokens() > self.token_budget && ctx.turns.len() > 3 {
            let removed = ctx.turns.remove(1);
            debug!(
                role = ?removed.role,
                chars = removed.content.len(),
                "Dropped oldest turn to fit the context budget"
            );
        }
    }
}
