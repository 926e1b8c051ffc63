//! Chat log and model-facing message types.
//!
//! A `ChatLog` is the append-only record of one conversation: user questions
//! and assistant answers, each optionally annotated with the note context the
//! answer was grounded in. The core reads the log but never mutates past
//! turns. `ChatMessage` is the transient `{role, content}` shape sent to the
//! completion provider; it is built per request and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

/// A single turn in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Unique turn ID
    pub id: String,

    /// Who produced this turn (User or Assistant)
    pub role: Role,

    /// The text of the turn
    pub message: String,

    /// Note context the turn was grounded in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            message: message.into(),
            context: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            message: message.into(),
            context: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the note context this turn was grounded in.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Render the turn's message with its note annotation appended.
    ///
    /// This is the flattened text the context-window builder packs into
    /// model messages.
    pub fn rendered(&self) -> String {
        match &self.context {
            Some(ctx) if !ctx.is_empty() => format!("{}\n\n Notes:\n{}", self.message, ctx),
            _ => format!("{}\n", self.message),
        }
    }
}

/// The append-only conversation log, oldest turn first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatLog {
    pub turns: Vec<ChatTurn>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the log as a plain transcript for embedding in prompts.
    ///
    /// User turns are labelled `User`, assistant turns take the agent's name.
    pub fn transcript(&self, agent_name: &str) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            match turn.role {
                Role::User => {
                    out.push_str(&format!("User: {}\n", turn.message));
                }
                Role::Assistant => {
                    out.push_str(&format!("{}: {}\n", agent_name, turn.message));
                }
                Role::System => {}
            }
        }
        out
    }
}

/// A model-facing message: the `{role, content}` pair sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
