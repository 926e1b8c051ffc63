//! Tool selection — one JSON-mode planning call per research iteration.
//!
//! The selector builds the planning prompt, asks the completion provider
//! for a decision, and parses it defensively. Any failure, from a provider
//! outage to an unrecognized tool name, collapses into a stop decision;
//! planning never aborts a research turn. The selector does not judge
//! whether the chosen tool makes sense for the question.

use chrono::Utc;
use lorebase_core::chat::{ChatLog, ChatMessage};
use lorebase_core::profile::{AgentProfile, Location};
use lorebase_core::provider::{CompletionProvider, CompletionRequest};
use lorebase_core::tool::{StatusSink, ToolDecision, ToolKind, render_catalog};
use lorebase_providers::{DEFAULT_MAX_ATTEMPTS, retry_with_backoff};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::iteration::{IterationRecord, render_previous_iterations};
use crate::prompts;

#[derive(Clone)]
pub struct ToolSelector {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    max_attempts: u32,
}

/// Everything the planner sees about the current turn.
pub struct SelectionContext<'a> {
    pub query: &'a str,
    pub chat_log: &'a ChatLog,
    pub profile: &'a AgentProfile,
    pub location: Option<&'a Location>,
    pub username: Option<&'a str>,
    pub history: &'a [IterationRecord],
    pub max_iterations: usize,
}

impl ToolSelector {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Pick the next tool to run, or a stop decision.
    pub async fn pick_next_tool(
        &self,
        ctx: &SelectionContext<'_>,
        sink: &dyn StatusSink,
    ) -> ToolDecision {
        let prompt = self.render_prompt(ctx);
        let request =
            CompletionRequest::new(&self.model, vec![ChatMessage::user(prompt)]).json_mode();

        let response = retry_with_backoff(self.max_attempts, || {
            self.provider.complete(request.clone())
        })
        .await;

        let raw = match response {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Planning call failed, stopping research");
                return ToolDecision::stop();
            }
        };

        let decision = parse_decision(&raw);
        if let Some(scratchpad) = &decision.scratchpad {
            if !scratchpad.is_empty() {
                sink.send(format!("**Reasoning:** {scratchpad}"));
            }
        }
        debug!(tool = ?decision.tool, query = ?decision.query, "Planner decision");
        decision
    }

    fn render_prompt(&self, ctx: &SelectionContext<'_>) -> String {
        let now = Utc::now();
        let personality = match &ctx.profile.personality {
            Some(p) => prompts::PERSONALITY_CONTEXT.replace("{personality}", p),
            None => String::new(),
        };
        let location = ctx
            .location
            .map(|l| format!("\nThe user is in {}.", l.display()))
            .unwrap_or_default();
        let username = ctx
            .username
            .map(|u| format!("\nThe user's name is {u}."))
            .unwrap_or_default();

        prompts::PLAN_NEXT_TOOL
            .replace("{name}", &ctx.profile.name)
            .replace("{personality}", &personality)
            .replace("{day_of_week}", &now.format("%A").to_string())
            .replace("{current_date}", &now.format("%Y-%m-%d").to_string())
            .replace("{location}", &location)
            .replace("{username}", &username)
            .replace("{tools}", &render_catalog(&ctx.profile.allowed_tools))
            .replace("{max_iterations}", &ctx.max_iterations.to_string())
            .replace("{chat_history}", &ctx.chat_log.transcript(&ctx.profile.name))
            .replace("{query}", ctx.query)
            .replace(
                "{previous_iterations}",
                &render_previous_iterations(ctx.history),
            )
    }
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    scratchpad: Option<String>,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    query: Option<String>,
}

/// Parse the planner's response into a decision.
///
/// Trims whitespace, strips a surrounding markdown fence, then decodes
/// JSON. Anything unparseable, and any tool name outside the catalog,
/// becomes a stop decision with a logged diagnostic.
fn parse_decision(raw: &str) -> ToolDecision {
    let cleaned = strip_fences(raw.trim());

    let parsed: RawDecision = match serde_json::from_str(cleaned) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, response = %cleaned, "Unparseable planner response, stopping research");
            return ToolDecision::stop();
        }
    };

    let tool = match parsed.tool.as_deref() {
        None | Some("null") | Some("") => None,
        Some(name) => match ToolKind::from_name(name) {
            Some(kind) => Some(kind),
            None => {
                warn!(tool = name, "Planner picked an unknown tool, stopping research");
                return ToolDecision {
                    tool: None,
                    query: None,
                    scratchpad: parsed.scratchpad,
                };
            }
        },
    };

    ToolDecision {
        tool,
        query: parsed.query.filter(|q| !q.is_empty()),
        scratchpad: parsed.scratchpad,
    }
}

/// Strip a surrounding ``` fence, with or without a language tag.
fn strip_fences(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{CollectingSink, SequentialMockProvider};
    use lorebase_core::error::ProviderError;

    fn context<'a>(profile: &'a AgentProfile, chat_log: &'a ChatLog) -> SelectionContext<'a> {
        SelectionContext {
            query: "what did I write about rust",
            chat_log,
            profile,
            location: None,
            username: None,
            history: &[],
            max_iterations: 5,
        }
    }

    #[test]
    fn parses_plain_json() {
        let decision = parse_decision(
            r#"{"scratchpad": "check notes first", "tool": "notes", "query": "rust"}"#,
        );
        assert_eq!(decision.tool, Some(ToolKind::Notes));
        assert_eq!(decision.query.as_deref(), Some("rust"));
        assert_eq!(decision.scratchpad.as_deref(), Some("check notes first"));
    }

    #[test]
    fn parses_fenced_json() {
        let decision =
            parse_decision("```json\n{\"tool\": \"online\", \"query\": \"rust news\"}\n```");
        assert_eq!(decision.tool, Some(ToolKind::Online));
    }

    #[test]
    fn null_tool_is_stop() {
        let decision = parse_decision(r#"{"tool": null, "query": null}"#);
        assert_eq!(decision.tool, None);
        assert_eq!(decision.query, None);
    }

    #[test]
    fn garbage_is_stop() {
        let decision = parse_decision("I think we should search the notes!");
        assert_eq!(decision, ToolDecision::stop());
    }

    #[test]
    fn unknown_tool_is_stop() {
        let decision = parse_decision(r#"{"tool": "telepathy", "query": "minds"}"#);
        assert_eq!(decision.tool, None);
        assert_eq!(decision.query, None);
    }

    #[tokio::test]
    async fn selector_emits_scratchpad_status() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Ok(
            r#"{"scratchpad": "notes look promising", "tool": "notes", "query": "rust"}"#
                .to_string(),
        )]));
        let selector = ToolSelector::new(provider, "gpt-4");
        let profile = AgentProfile::default();
        let chat_log = ChatLog::new();
        let sink = CollectingSink::default();

        let decision = selector.pick_next_tool(&context(&profile, &chat_log), &sink).await;
        assert_eq!(decision.tool, Some(ToolKind::Notes));

        let statuses = sink.messages();
        assert_eq!(statuses.len(), 1);
        assert!(statuses[0].contains("notes look promising"));
    }

    #[tokio::test]
    async fn provider_failure_collapses_to_stop() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let selector = ToolSelector::new(provider, "gpt-4").with_max_attempts(1);
        let profile = AgentProfile::default();
        let chat_log = ChatLog::new();

        let decision = selector
            .pick_next_tool(
                &context(&profile, &chat_log),
                &lorebase_core::tool::NullStatusSink,
            )
            .await;
        assert_eq!(decision, ToolDecision::stop());
    }

    #[tokio::test]
    async fn prompt_reflects_allow_list() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Ok(
            r#"{"tool": null}"#.to_string()
        )]));
        let selector = ToolSelector::new(provider, "gpt-4");
        let profile =
            AgentProfile::default().with_allowed_tools(vec![ToolKind::Notes, ToolKind::Online]);
        let chat_log = ChatLog::new();

        let prompt = selector.render_prompt(&context(&profile, &chat_log));
        assert!(prompt.contains("\"notes\""));
        assert!(prompt.contains("\"online\""));
        assert!(!prompt.contains("\"webpage\""));
        assert!(!prompt.contains("{max_iterations}"));
        assert!(prompt.contains('5'));
    }
}
