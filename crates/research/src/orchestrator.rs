//! The research orchestrator — select a tool, run it, aggregate, repeat.
//!
//! One `run()` serves one user turn: the loop executes at most
//! `max_iterations` rounds of planning and tool execution, streaming
//! status lines and finished iteration records through a channel as they
//! happen. A planner stop decision, an empty notes result, or the
//! iteration cap ends the turn. Tool failures degrade to empty evidence
//! and never abort the run.

use lorebase_core::chat::ChatLog;
use lorebase_core::profile::{AgentProfile, Location};
use lorebase_core::tool::{
    CodeRunner, FileSummarizer, NotesSearch, OnlineSearch, StatusSink, ToolKind, WebpageReader,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::ResearchEvent;
use crate::iteration::IterationRecord;
use crate::selector::{SelectionContext, ToolSelector};

/// The executors the loop dispatches to, one per tool kind.
#[derive(Clone)]
pub struct ToolExecutors {
    pub notes: Arc<dyn NotesSearch>,
    pub online: Arc<dyn OnlineSearch>,
    pub webpage: Arc<dyn WebpageReader>,
    pub code: Arc<dyn CodeRunner>,
    pub summarize: Arc<dyn FileSummarizer>,
}

/// One user turn's worth of research input.
#[derive(Clone)]
pub struct ResearchRequest {
    /// The user's question.
    pub query: String,

    /// The conversation so far. Read-only to the loop.
    pub chat_log: ChatLog,

    /// File filters active on the conversation.
    pub file_filters: Vec<String>,

    /// The user's approximate location, if known.
    pub location: Option<Location>,

    /// The user's name, if known.
    pub username: Option<String>,
}

impl ResearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            chat_log: ChatLog::new(),
            file_filters: Vec::new(),
            location: None,
            username: None,
        }
    }
}

/// Forwards tool status lines into the research event stream, preserving
/// their order relative to iteration records.
pub struct ChannelStatusSink {
    tx: mpsc::UnboundedSender<ResearchEvent>,
}

impl ChannelStatusSink {
    pub fn new(tx: mpsc::UnboundedSender<ResearchEvent>) -> Self {
        Self { tx }
    }
}

impl StatusSink for ChannelStatusSink {
    fn send(&self, message: String) {
        let _ = self.tx.send(ResearchEvent::Status { message });
    }
}

pub struct ResearchOrchestrator {
    selector: ToolSelector,
    executors: ToolExecutors,
    profile: AgentProfile,
    max_iterations: usize,
}

impl ResearchOrchestrator {
    pub fn new(selector: ToolSelector, executors: ToolExecutors, profile: AgentProfile) -> Self {
        Self {
            selector,
            executors,
            profile,
            max_iterations: 5,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Run one research turn.
    ///
    /// Returns immediately with the receiving end of the event stream;
    /// the loop itself runs on a spawned task. The channel closes when
    /// the run finishes. A run is not restartable.
    pub fn run(&self, request: ResearchRequest) -> mpsc::UnboundedReceiver<ResearchEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        let selector = self.selector.clone();
        let executors = self.executors.clone();
        let profile = self.profile.clone();
        let max_iterations = self.max_iterations;

        tokio::spawn(async move {
            run_loop(selector, executors, profile, max_iterations, request, tx).await;
        });

        rx
    }
}

async fn run_loop(
    selector: ToolSelector,
    executors: ToolExecutors,
    profile: AgentProfile,
    max_iterations: usize,
    request: ResearchRequest,
    tx: mpsc::UnboundedSender<ResearchEvent>,
) {
    let sink = ChannelStatusSink::new(tx.clone());
    let mut history: Vec<IterationRecord> = Vec::new();
    let mut iteration = 0usize;

    info!(query = %request.query, max_iterations, "Research loop starting");

    while iteration < max_iterations {
        let ctx = SelectionContext {
            query: &request.query,
            chat_log: &request.chat_log,
            profile: &profile,
            location: request.location.as_ref(),
            username: request.username.as_deref(),
            history: &history,
            max_iterations,
        };
        let decision = selector.pick_next_tool(&ctx, &sink).await;
        let mut record = IterationRecord::new(decision.tool, decision.query.clone());
        let query = decision.query.unwrap_or_default();

        match decision.tool {
            Some(ToolKind::Notes) => {
                match executors
                    .notes
                    .search(
                        &query,
                        &request.chat_log,
                        &request.file_filters,
                        request.location.as_ref(),
                        &sink,
                    )
                    .await
                {
                    Ok(references) => record.note_context = references,
                    Err(e) => {
                        warn!(tool = "notes", query = %query, error = %e, "Tool execution failed")
                    }
                }
                // Notes grounding is decisive: when the personal index has
                // nothing, further rounds will not help. End the turn.
                if record.note_context.is_empty() {
                    debug!("Notes search found nothing, ending research");
                    iteration = max_iterations;
                }
            }
            Some(ToolKind::Online) => {
                match executors
                    .online
                    .search(&query, request.location.as_ref(), &sink)
                    .await
                {
                    Ok(results) => record.online_context = results,
                    Err(e) => {
                        warn!(tool = "online", query = %query, error = %e, "Tool execution failed")
                    }
                }
            }
            Some(ToolKind::Webpage) => {
                match executors.webpage.read(&query, &sink).await {
                    // Page content lands in the online map under the same
                    // keys, alongside any earlier organic results.
                    Ok(results) => {
                        for (key, result) in results {
                            record.online_context.entry(key).or_default().merge(result);
                        }
                    }
                    Err(e) => {
                        warn!(tool = "webpage", query = %query, error = %e, "Tool execution failed")
                    }
                }
            }
            Some(ToolKind::Code) => {
                match executors.code.run(&query, &request.chat_log, &sink).await {
                    Ok(results) => record.code_context = results,
                    Err(e) => {
                        warn!(tool = "code", query = %query, error = %e, "Tool execution failed")
                    }
                }
            }
            Some(ToolKind::Summarize) => {
                match executors
                    .summarize
                    .summarize(&query, &request.file_filters, &sink)
                    .await
                {
                    Ok(summary) => record.summarized_files = summary,
                    Err(e) => {
                        warn!(tool = "summarize", query = %query, error = %e, "Tool execution failed")
                    }
                }
            }
            None => {
                debug!("Planner chose to stop researching");
                iteration = max_iterations;
            }
        }

        record.aggregate();
        history.push(record.clone());
        let _ = tx.send(ResearchEvent::Iteration { record });
        iteration += 1;
    }

    info!(iterations = history.len(), "Research loop finished");
}
