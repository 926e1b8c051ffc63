//! Completion provider implementations for Lorebase.
//!
//! - `openai_compat` — async chat completions plus blocking SSE streaming
//!   against any OpenAI-style endpoint
//! - `backoff` — bounded, jittered retry for transient provider errors

pub mod backoff;
pub mod openai_compat;

pub use backoff::{DEFAULT_MAX_ATTEMPTS, retry_with_backoff};
pub use openai_compat::OpenAiCompatProvider;
