//! File summarizer — condenses a single document in full.
//!
//! Only usable when the conversation is filtered to exactly one file. The
//! document body is truncated to the model's prompt budget before the
//! summary request goes out.

use async_trait::async_trait;
use lorebase_core::chat::ChatMessage;
use lorebase_core::error::ToolError;
use lorebase_core::provider::{CompletionProvider, CompletionRequest};
use lorebase_core::tokenizer::{Tokenizer, max_prompt_size};
use lorebase_core::tool::{FileSummarizer, StatusSink};
use std::sync::Arc;
use tracing::debug;

const SUMMARY_PROMPT: &str = "\
Summarize the following document with respect to this request: {query}

Document ({file}):
{content}";

/// The document storage behind summarization.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the full text of a document, or `None` if it does not exist.
    async fn fetch(&self, file: &str) -> Result<Option<String>, ToolError>;
}

pub struct FileSummarizerTool {
    provider: Arc<dyn CompletionProvider>,
    store: Arc<dyn DocumentStore>,
    tokenizer: Arc<dyn Tokenizer>,
    model: String,
}

impl FileSummarizerTool {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn DocumentStore>,
        tokenizer: Arc<dyn Tokenizer>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            tokenizer,
            model: model.into(),
        }
    }
}

#[async_trait]
impl FileSummarizer for FileSummarizerTool {
    async fn summarize(
        &self,
        query: &str,
        file_filters: &[String],
        sink: &dyn StatusSink,
    ) -> Result<String, ToolError> {
        let [file] = file_filters else {
            return Err(ToolError::InvalidArguments(format!(
                "summarization needs exactly one file filter, got {}",
                file_filters.len()
            )));
        };

        sink.send(format!("**Reading {file} for summarization**"));

        let content = self
            .store
            .fetch(file)
            .await?
            .ok_or_else(|| ToolError::ExecutionFailed {
                tool: "summarize".into(),
                reason: format!("file not found: {file}"),
            })?;

        // Leave headroom for the prompt scaffolding and the reply.
        let budget = max_prompt_size(&self.model)
            .map(|b| b.saturating_sub(512))
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let tokens = self.tokenizer.encode(&content);
        let content = if tokens.len() > budget {
            debug!(file, tokens = tokens.len(), budget, "Truncating document to budget");
            self.tokenizer.decode(&tokens[..budget])
        } else {
            content
        };

        let prompt = SUMMARY_PROMPT
            .replace("{query}", query)
            .replace("{file}", file)
            .replace("{content}", &content);

        let request = CompletionRequest::new(&self.model, vec![ChatMessage::user(prompt)]);
        let summary = self.provider.complete(request).await?;

        sink.send(format!("**Summarized {file}**"));
        Ok(summary)
    }
}
