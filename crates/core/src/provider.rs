//! Completion provider traits — the abstraction over LLM backends.
//!
//! `CompletionProvider` is the async request/response surface the selector
//! and tools use. `StreamingCompletion` is the blocking, callback-driven
//! surface the streaming bridge drives from its dedicated worker thread.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::error::ProviderError;

/// Constrains the shape of the model's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free-form prose
    Text,
    /// The model must emit a single valid JSON object
    JsonObject,
}

impl Default for ResponseFormat {
    fn default() -> Self {
        ResponseFormat::Text
    }
}

/// A completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-4")
    pub model: String,

    /// The conversation messages, chronological order
    pub messages: Vec<ChatMessage>,

    /// Temperature (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Output shape constraint
    #[serde(default)]
    pub response_format: ResponseFormat,
}

fn default_temperature() -> f32 {
    0.2
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            response_format: ResponseFormat::Text,
        }
    }

    /// Require the model to answer with a single JSON object.
    pub fn json_mode(mut self) -> Self {
        self.response_format = ResponseFormat::JsonObject;
        self
    }
}

/// The async completion surface.
///
/// The research loop calls `complete()` without knowing which backend is
/// behind it. Implementations map transport failures onto the transient
/// error taxonomy so the retry wrapper can classify them.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and return the complete response text.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<String, ProviderError>;
}

/// The blocking streaming surface, driven from a dedicated OS thread.
///
/// `complete_blocking` must call `on_token` once per generated fragment, in
/// order, and return only when the stream is finished or failed. It never
/// runs on the async runtime.
pub trait StreamingCompletion: Send + Sync {
    fn complete_blocking(
        &self,
        request: CompletionRequest,
        on_token: &mut dyn FnMut(&str),
    ) -> std::result::Result<(), ProviderError>;
}
