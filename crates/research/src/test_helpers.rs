//! Shared test doubles for the research crate.
//!
//! `SequentialMockProvider` returns scripted completions in order, which
//! is how tests drive the planner through multi-iteration scenarios. The
//! mock executors return fixed results without touching the network.

use async_trait::async_trait;
use lorebase_core::chat::ChatLog;
use lorebase_core::error::{ProviderError, ToolError};
use lorebase_core::profile::Location;
use lorebase_core::provider::{CompletionProvider, CompletionRequest};
use lorebase_core::tool::{
    CodeResult, CodeRunner, FileSummarizer, NotesSearch, OnlineSearch, OrganicHit, Reference,
    StatusSink, WebResult, WebpageReader,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

/// A provider that returns scripted responses in sequence.
pub struct SequentialMockProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    /// Script a sequence of planner decisions.
    pub fn decisions(decisions: &[(Option<&str>, Option<&str>)]) -> Self {
        Self::new(
            decisions
                .iter()
                .map(|(tool, query)| Ok(decision_json(*tool, *query)))
                .collect(),
        )
    }
}

/// Render a planner decision as the JSON the selector expects.
pub fn decision_json(tool: Option<&str>, query: Option<&str>) -> String {
    serde_json::json!({
        "scratchpad": "scripted",
        "tool": tool,
        "query": query,
    })
    .to_string()
}

#[async_trait]
impl CompletionProvider for SequentialMockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
        let mut responses = self.responses.lock().unwrap();
        responses
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::MalformedResponse("mock exhausted".into())))
    }
}

/// Collects status messages for assertions.
#[derive(Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl StatusSink for CollectingSink {
    fn send(&self, message: String) {
        self.messages.lock().unwrap().push(message);
    }
}

// --- Mock executors ---

/// Returns a fixed set of references for any query.
pub struct MockNotes {
    pub references: Vec<Reference>,
}

impl MockNotes {
    pub fn empty() -> Self {
        Self { references: vec![] }
    }

    pub fn with_hits(count: usize) -> Self {
        Self {
            references: (0..count)
                .map(|i| Reference {
                    query: "q".into(),
                    compiled: format!("passage {i}"),
                    file: format!("notes/{i}.md"),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl NotesSearch for MockNotes {
    async fn search(
        &self,
        _query: &str,
        _chat_log: &ChatLog,
        _file_filters: &[String],
        _location: Option<&Location>,
        _sink: &dyn StatusSink,
    ) -> Result<Vec<Reference>, ToolError> {
        Ok(self.references.clone())
    }
}

/// Returns one organic hit under the query's key.
pub struct MockOnline;

#[async_trait]
impl OnlineSearch for MockOnline {
    async fn search(
        &self,
        query: &str,
        _location: Option<&Location>,
        sink: &dyn StatusSink,
    ) -> Result<BTreeMap<String, WebResult>, ToolError> {
        sink.send(format!("**Searching the web for:** {query}"));
        let mut map = BTreeMap::new();
        map.insert(
            query.to_string(),
            WebResult {
                organic: vec![OrganicHit {
                    title: format!("Result for {query}"),
                    link: "https://example.com".into(),
                    snippet: Some("snippet".into()),
                }],
                webpages: BTreeMap::new(),
            },
        );
        Ok(map)
    }
}

/// Returns one fetched page under the query's key.
pub struct MockWebpage;

#[async_trait]
impl WebpageReader for MockWebpage {
    async fn read(
        &self,
        query: &str,
        _sink: &dyn StatusSink,
    ) -> Result<BTreeMap<String, WebResult>, ToolError> {
        let mut webpages = BTreeMap::new();
        webpages.insert("https://example.com/page".to_string(), "page text".to_string());
        let mut map = BTreeMap::new();
        map.insert(
            query.to_string(),
            WebResult {
                organic: vec![],
                webpages,
            },
        );
        Ok(map)
    }
}

/// Succeeds with a fixed run, or always fails.
pub struct MockCode {
    pub fail: bool,
}

#[async_trait]
impl CodeRunner for MockCode {
    async fn run(
        &self,
        query: &str,
        _chat_log: &ChatLog,
        _sink: &dyn StatusSink,
    ) -> Result<BTreeMap<String, CodeResult>, ToolError> {
        if self.fail {
            return Err(ToolError::Upstream("sandbox unreachable".into()));
        }
        let mut map = BTreeMap::new();
        map.insert(
            query.to_string(),
            CodeResult {
                code: "print(42)".into(),
                std_out: "42\n".into(),
                std_err: String::new(),
            },
        );
        Ok(map)
    }
}

/// Returns a fixed summary.
pub struct MockSummarizer {
    pub summary: String,
}

#[async_trait]
impl FileSummarizer for MockSummarizer {
    async fn summarize(
        &self,
        _query: &str,
        _file_filters: &[String],
        _sink: &dyn StatusSink,
    ) -> Result<String, ToolError> {
        Ok(self.summary.clone())
    }
}
