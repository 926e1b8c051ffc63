//! Tool kinds, selection decisions, result shapes, and executor traits.
//!
//! The tool set is a closed enum rather than an open registry: the research
//! loop dispatches with an explicit match, so adding a capability means
//! adding a variant and taking the compile error to every dispatch site.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::chat::ChatLog;
use crate::error::ToolError;
use crate::profile::Location;

/// The capabilities the research loop can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Search the user's personal document index
    Notes,
    /// Search the internet
    Online,
    /// Read specific webpages
    Webpage,
    /// Generate and run code in a sandbox
    Code,
    /// Summarize a single document in full
    Summarize,
}

impl ToolKind {
    /// All kinds, in catalog order.
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Notes,
        ToolKind::Online,
        ToolKind::Webpage,
        ToolKind::Code,
        ToolKind::Summarize,
    ];

    /// The wire name the planning model uses to pick this tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Notes => "notes",
            ToolKind::Online => "online",
            ToolKind::Webpage => "webpage",
            ToolKind::Code => "code",
            ToolKind::Summarize => "summarize",
        }
    }

    /// The capability prose sent to the planning model.
    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::Notes => {
                "To search the user's personal knowledge base. Use this over online search when the question concerns the user's own notes, documents, or past conversations."
            }
            ToolKind::Online => {
                "To search the internet for current information, news, facts, and public knowledge the user's notes cannot answer."
            }
            ToolKind::Webpage => {
                "To read the contents of one or more specific webpages. Use when the exact URLs to read are already known."
            }
            ToolKind::Code => {
                "To write and run simple Python programs in a sandbox. Use for math, data analysis, and small computations."
            }
            ToolKind::Summarize => {
                "To summarize a single document in its entirety. Only usable when the conversation is filtered to exactly one file."
            }
        }
    }

    /// Parse a wire name back into a kind.
    pub fn from_name(name: &str) -> Option<ToolKind> {
        ToolKind::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Render the tool catalog for a planning prompt, honoring an optional
/// allow-list from the agent profile. An empty allow-list means everything.
pub fn render_catalog(allowed: &[ToolKind]) -> String {
    let mut out = String::new();
    for kind in ToolKind::ALL {
        if !allowed.is_empty() && !allowed.contains(&kind) {
            continue;
        }
        out.push_str(&format!("- \"{}\": {}\n", kind.name(), kind.description()));
    }
    out
}

/// The planning model's choice of what to do next.
///
/// `tool == None` means "stop researching and answer now". Parse failures
/// and unrecognized tool names collapse to this same shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolDecision {
    pub tool: Option<ToolKind>,
    pub query: Option<String>,
    pub scratchpad: Option<String>,
}

impl ToolDecision {
    /// The decision that ends the research loop.
    pub fn stop() -> Self {
        Self::default()
    }
}

/// A hit from the personal document index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// The query that produced this hit
    pub query: String,
    /// The matching passage
    pub compiled: String,
    /// Source file path
    pub file: String,
}

/// Results gathered from the web for one subquery: organic search hits
/// plus any full pages read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organic: Vec<OrganicHit>,

    /// Fetched page content keyed by URL
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub webpages: BTreeMap<String, String>,
}

impl WebResult {
    pub fn is_empty(&self) -> bool {
        self.organic.is_empty() && self.webpages.is_empty()
    }

    /// Fold another result for the same subquery into this one.
    pub fn merge(&mut self, other: WebResult) {
        self.organic.extend(other.organic);
        self.webpages.extend(other.webpages);
    }
}

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganicHit {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// The outcome of one sandboxed code run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeResult {
    /// The generated program
    pub code: String,
    /// Captured stdout
    #[serde(default)]
    pub std_out: String,
    /// Captured stderr
    #[serde(default)]
    pub std_err: String,
}

/// Receives human-readable progress lines while a tool runs.
///
/// Implementations forward them into whatever event stream the caller owns.
/// Sending is infallible; a closed consumer just drops the update.
pub trait StatusSink: Send + Sync {
    fn send(&self, message: String);
}

/// A sink that discards everything. Useful in tests and one-shot calls.
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn send(&self, _message: String) {}
}

// --- Executor traits ---
//
// One narrow trait per tool kind. The research crate dispatches on
// ToolKind and awaits exactly one of these per iteration.

/// Searches the personal document index.
#[async_trait]
pub trait NotesSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        chat_log: &ChatLog,
        file_filters: &[String],
        location: Option<&Location>,
        sink: &dyn StatusSink,
    ) -> std::result::Result<Vec<Reference>, ToolError>;
}

/// Searches the open internet.
#[async_trait]
pub trait OnlineSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        location: Option<&Location>,
        sink: &dyn StatusSink,
    ) -> std::result::Result<BTreeMap<String, WebResult>, ToolError>;
}

/// Reads specific webpages named in the query.
#[async_trait]
pub trait WebpageReader: Send + Sync {
    async fn read(
        &self,
        query: &str,
        sink: &dyn StatusSink,
    ) -> std::result::Result<BTreeMap<String, WebResult>, ToolError>;
}

/// Generates and executes code in a sandbox.
#[async_trait]
pub trait CodeRunner: Send + Sync {
    async fn run(
        &self,
        query: &str,
        chat_log: &ChatLog,
        sink: &dyn StatusSink,
    ) -> std::result::Result<BTreeMap<String, CodeResult>, ToolError>;
}

/// Summarizes the single document the conversation is filtered to.
#[async_trait]
pub trait FileSummarizer: Send + Sync {
    async fn summarize(
        &self,
        query: &str,
        file_filters: &[String],
        sink: &dyn StatusSink,
    ) -> std::result::Result<String, ToolError>;
}
