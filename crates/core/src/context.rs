//! Conversation context — the per-request working state of the loop.
//!
//! A `ConversationContext` is created when a user request enters the
//! orchestrator, mutated only by the iteration controller appending turns
//! and records, and discarded (or archived by an external persistence
//! collaborator) when the loop terminates. It is exclusively owned by one
//! in-flight request and never shared across concurrent requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::outcome::IterationRecord;
use crate::plugin::PluginResult;

/// The role of a turn in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The language model
    Model,
    /// Orchestrator-injected instructions and plugin feedback
    System,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The working state of one orchestrated request: the ordered turns plus
/// the append-only iteration log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    /// The request this context belongs to
    pub request_id: String,

    /// Ordered turns, starting with the original user request
    pub turns: Vec<Turn>,

    /// One record per completed loop pass, append-only
    pub records: Vec<IterationRecord>,

    /// When this context was created
    pub created_at: DateTime<Utc>,
}

impl ConversationContext {
    /// Create a context for a new request, seeded with the user's message.
    pub fn new(request_id: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            turns: vec![Turn::user(user_message)],
            records: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append a turn.
    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Append an iteration record. The index is assigned here, which is
    /// what keeps the log ordered and gap-free.
    pub fn push_record(&mut self, action: Action, result: Option<PluginResult>) {
        let index = self.records.len();
        self.records.push(IterationRecord {
            index,
            action,
            result,
        });
    }

    /// Number of completed plugin rounds (records with a folded-in result).
    pub fn plugin_rounds(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_some()).count()
    }

    /// The original user request text.
    pub fn user_message(&self) -> &str {
        &self.turns[0].content
    }

    /// Rough token estimate across all turns (4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.turns.iter().map(|t| t.content.len() / 4).sum()
    }
}
