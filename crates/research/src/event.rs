//! Research-level streaming events.
//!
//! `ResearchEvent` is what the orchestrator pushes through its channel: a
//! human-readable progress line, or a completed iteration record. A caller
//! can forward these to clients over SSE or WebSocket.

use serde::{Deserialize, Serialize};

use crate::iteration::IterationRecord;

/// Events emitted while a research run progresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResearchEvent {
    /// Human-readable progress line.
    Status { message: String },

    /// A research iteration finished.
    Iteration { record: IterationRecord },
}

impl ResearchEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Iteration { .. } => "iteration",
        }
    }
}
