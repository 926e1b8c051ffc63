//! Agent profile and user context.
//!
//! Profiles arrive as explicit data from the caller; the research core never
//! reads ambient state to discover who it is speaking for.

use serde::{Deserialize, Serialize};

use crate::tool::ToolKind;

/// The persona the assistant answers as, plus any capability restrictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// The agent's display name
    pub name: String,

    /// Personality prose injected into planning prompts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,

    /// Tools this agent may use. Empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_tools: Vec<ToolKind>,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            personality: None,
            allowed_tools: Vec::new(),
        }
    }

    pub fn with_personality(mut self, personality: impl Into<String>) -> Self {
        self.personality = Some(personality.into());
        self
    }

    pub fn with_allowed_tools(mut self, tools: Vec<ToolKind>) -> Self {
        self.allowed_tools = tools;
        self
    }
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self::new("Lore")
    }
}

/// The user's approximate location, for localizing searches and prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl Location {
    /// Render as "city, region, country", skipping missing parts.
    pub fn display(&self) -> String {
        [&self.city, &self.region, &self.country]
            .into_iter()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}
