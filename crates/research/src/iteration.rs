//! Iteration records — what one round of research decided and found.
//!
//! A record is created fresh each iteration, filled by exactly one tool
//! branch, aggregated, appended to the per-turn history, and never mutated
//! again. The aggregated summary feeds later planning calls, not the user.

use lorebase_core::tool::{CodeResult, Reference, ToolKind, WebResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// One round of tool selection and execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IterationRecord {
    /// The tool the planner chose; `None` means it decided to stop.
    pub tool: Option<ToolKind>,

    /// The query the planner generated for that tool.
    pub query: Option<String>,

    /// Document passages from notes search.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note_context: Vec<Reference>,

    /// Web results keyed by subquery. Webpage reads merge in here.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub online_context: BTreeMap<String, WebResult>,

    /// Sandboxed code runs keyed by query.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub code_context: BTreeMap<String, CodeResult>,

    /// Output of single-file summarization.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summarized_files: String,

    /// The rendered results block for later planning calls.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub aggregated_summary: String,
}

impl IterationRecord {
    pub fn new(tool: Option<ToolKind>, query: Option<String>) -> Self {
        Self {
            tool,
            query,
            ..Self::default()
        }
    }

    /// Whether any tool branch produced evidence this round.
    pub fn has_results(&self) -> bool {
        !self.note_context.is_empty()
            || !self.online_context.is_empty()
            || !self.code_context.is_empty()
            || !self.summarized_files.is_empty()
    }

    /// Render gathered results into `aggregated_summary`.
    ///
    /// Sections appear in a stable order so later planning prompts are
    /// deterministic, with values rendered as YAML.
    pub fn aggregate(&mut self) {
        if !self.has_results() {
            return;
        }

        let mut block = String::from("**Results**:\n");
        if !self.note_context.is_empty() {
            block.push_str(&format!(
                "**Document References**:\n{}\n",
                to_yaml(&self.note_context)
            ));
        }
        if !self.online_context.is_empty() {
            block.push_str(&format!(
                "**Online Results**:\n{}\n",
                to_yaml(&self.online_context)
            ));
        }
        if !self.code_context.is_empty() {
            block.push_str(&format!(
                "**Code Results**:\n{}\n",
                to_yaml(&self.code_context)
            ));
        }
        if !self.summarized_files.is_empty() {
            block.push_str(&format!(
                "**Summarized Files**:\n{}\n",
                self.summarized_files
            ));
        }
        self.aggregated_summary = block;
    }
}

fn to_yaml<T: Serialize>(value: &T) -> String {
    serde_yaml::to_string(value).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to render results as YAML");
        String::new()
    })
}

/// Render past iterations for the planning prompt.
pub fn render_previous_iterations(history: &[IterationRecord]) -> String {
    if history.is_empty() {
        return "None".to_string();
    }

    let mut out = String::new();
    for (index, record) in history.iter().enumerate() {
        let result = if record.aggregated_summary.is_empty() {
            "**Results**: No results found."
        } else {
            record.aggregated_summary.as_str()
        };
        out.push_str(&format!(
            "## Iteration {}:\n- tool: {}\n- query: {}\n{}\n\n",
            index + 1,
            record
                .tool
                .map(|t| t.name())
                .unwrap_or("None"),
            record.query.as_deref().unwrap_or("None"),
            result,
        ));
    }
    out
}
