//! Code runner — generates a program with the completion provider and
//! executes it in a sandbox HTTP service.
//!
//! The sandbox contract is a single POST accepting `{"code": ...}` and
//! returning `{"std_out": ..., "std_err": ...}`. Nothing here executes
//! code in-process.

use async_trait::async_trait;
use lorebase_core::chat::{ChatLog, ChatMessage};
use lorebase_core::error::ToolError;
use lorebase_core::provider::{CompletionProvider, CompletionRequest};
use lorebase_core::tool::{CodeResult, CodeRunner, StatusSink};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

const GENERATION_PROMPT: &str = "\
You are a Python programmer. Write a single self-contained Python script that \
answers the question below. Print the answer to stdout. Respond with only the \
code, no explanation.

Conversation so far:
{chat_history}

Question: {query}";

pub struct CodeRunnerTool {
    provider: Arc<dyn CompletionProvider>,
    client: reqwest::Client,
    sandbox_url: String,
    model: String,
}

impl CodeRunnerTool {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        sandbox_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            client: reqwest::Client::new(),
            sandbox_url: sandbox_url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl CodeRunner for CodeRunnerTool {
    async fn run(
        &self,
        query: &str,
        chat_log: &ChatLog,
        sink: &dyn StatusSink,
    ) -> Result<BTreeMap<String, CodeResult>, ToolError> {
        sink.send(format!("**Writing code to answer:** {query}"));

        let prompt = GENERATION_PROMPT
            .replace("{chat_history}", &chat_log.transcript("Assistant"))
            .replace("{query}", query);

        let request = CompletionRequest::new(&self.model, vec![ChatMessage::user(prompt)]);
        let raw = self.provider.complete(request).await?;
        let code = strip_code_fences(&raw);

        if code.is_empty() {
            return Err(ToolError::ExecutionFailed {
                tool: "code".into(),
                reason: "model produced no code".into(),
            });
        }

        sink.send("**Running code in sandbox**".to_string());
        debug!(chars = code.len(), "Submitting generated code to sandbox");

        let response = self
            .client
            .post(&self.sandbox_url)
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await
            .map_err(|e| ToolError::Upstream(format!("sandbox unreachable: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Upstream(format!(
                "sandbox returned {status}: {body}"
            )));
        }

        let run: SandboxResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("unparseable sandbox response: {e}")))?;

        let mut results = BTreeMap::new();
        results.insert(
            query.to_string(),
            CodeResult {
                code,
                std_out: run.std_out,
                std_err: run.std_err,
            },
        );
        Ok(results)
    }
}

/// Strip a surrounding markdown code fence, if present.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop the language tag on the opening fence line.
    match inner.split_once('\n') {
        Some((first, rest)) if first.len() <= 20 && !first.contains(' ') => rest.trim().to_string(),
        _ => inner.trim().to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct SandboxResponse {
    #[serde(default)]
    std_out: String,
    #[serde(default)]
    std_err: String,
}
