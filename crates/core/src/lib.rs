//! # Lorebase Core
//!
//! Domain types, traits, and error definitions for the Lorebase research
//! engine. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external subsystem the research loop touches is defined as a trait
//! here: completion providers, the document index, the tokenizer, the status
//! sink. Implementations live in their respective crates, so the loop can be
//! tested against scripted mocks and the dependency graph stays inward.

pub mod chat;
pub mod error;
pub mod profile;
pub mod provider;
pub mod tokenizer;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use chat::{ChatLog, ChatMessage, ChatTurn, Role};
pub use error::{Error, ProviderError, Result, ToolError};
pub use profile::{AgentProfile, Location};
pub use provider::{CompletionProvider, CompletionRequest, ResponseFormat, StreamingCompletion};
pub use tokenizer::{ChunkTokenizer, Tokenizer, max_prompt_size};
pub use tool::{
    CodeResult, CodeRunner, FileSummarizer, NotesSearch, NullStatusSink, OnlineSearch,
    OrganicHit, Reference, StatusSink, ToolDecision, ToolKind, WebResult, WebpageReader,
};
