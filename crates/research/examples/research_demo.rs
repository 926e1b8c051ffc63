//! Runs one research turn against an in-memory notes index, with a
//! scripted planner standing in for the completion provider. Prints every
//! event as it streams out of the loop.
//!
//! ```sh
//! cargo run -p lorebase-research --example research_demo
//! ```

use async_trait::async_trait;
use lorebase_config::AppConfig;
use lorebase_core::chat::ChatLog;
use lorebase_core::error::{ProviderError, ToolError};
use lorebase_core::profile::{AgentProfile, Location};
use lorebase_core::provider::{CompletionProvider, CompletionRequest};
use lorebase_core::tool::{CodeResult, CodeRunner, FileSummarizer, OnlineSearch, StatusSink, WebResult, WebpageReader};
use lorebase_research::{ResearchEvent, ResearchOrchestrator, ResearchRequest, ToolExecutors, ToolSelector};
use lorebase_tools::{InMemoryIndex, NotesSearchTool};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Plays back canned planning decisions in order.
struct ScriptedPlanner {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedPlanner {
    fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedPlanner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::MalformedResponse("script exhausted".into()))
    }
}

/// Offline stand-ins for the executors the demo does not exercise.
struct Offline;

#[async_trait]
impl OnlineSearch for Offline {
    async fn search(
        &self,
        _query: &str,
        _location: Option<&Location>,
        _sink: &dyn StatusSink,
    ) -> Result<BTreeMap<String, WebResult>, ToolError> {
        Err(ToolError::Upstream("offline demo".into()))
    }
}

#[async_trait]
impl WebpageReader for Offline {
    async fn read(
        &self,
        _query: &str,
        _sink: &dyn StatusSink,
    ) -> Result<BTreeMap<String, WebResult>, ToolError> {
        Err(ToolError::Upstream("offline demo".into()))
    }
}

#[async_trait]
impl CodeRunner for Offline {
    async fn run(
        &self,
        _query: &str,
        _chat_log: &ChatLog,
        _sink: &dyn StatusSink,
    ) -> Result<BTreeMap<String, CodeResult>, ToolError> {
        Err(ToolError::Upstream("offline demo".into()))
    }
}

#[async_trait]
impl FileSummarizer for Offline {
    async fn summarize(
        &self,
        _query: &str,
        _file_filters: &[String],
        _sink: &dyn StatusSink,
    ) -> Result<String, ToolError> {
        Err(ToolError::Upstream("offline demo".into()))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::default();

    let mut index = InMemoryIndex::new();
    index.add(
        "notes/rust.md",
        "Ownership means every value has exactly one owner. Borrowing lets \
         code read or mutate through references without taking ownership.",
    );
    index.add(
        "notes/gardening.md",
        "Tomatoes want full sun and deep, infrequent watering.",
    );

    let planner = Arc::new(ScriptedPlanner::new(vec![
        r#"{"scratchpad": "Personal notes are the best first source.", "tool": "notes", "query": "rust ownership"}"#,
        r#"{"scratchpad": "The notes cover it. Nothing left to gather.", "tool": null, "query": null}"#,
    ]));

    let offline = Arc::new(Offline);
    let executors = ToolExecutors {
        notes: Arc::new(NotesSearchTool::new(Arc::new(index))),
        online: offline.clone(),
        webpage: offline.clone(),
        code: offline.clone(),
        summarize: offline,
    };

    let selector = ToolSelector::new(planner, &config.provider.model);
    let orchestrator = ResearchOrchestrator::new(selector, executors, AgentProfile::default())
        .with_max_iterations(config.research.max_iterations);

    let mut rx = orchestrator.run(ResearchRequest::new("what did I write about ownership?"));
    while let Some(event) = rx.recv().await {
        match event {
            ResearchEvent::Status { message } => println!("[status] {message}"),
            ResearchEvent::Iteration { record } => {
                println!(
                    "[iteration] tool={:?} references={} summary_len={}",
                    record.tool,
                    record.note_context.len(),
                    record.aggregated_summary.len(),
                );
            }
        }
    }
}
