//! Iterative research over a personal knowledge base.
//!
//! The orchestrator runs a bounded loop of plan, execute, aggregate: a
//! planning call picks the next tool, the matching executor gathers
//! evidence, and the aggregated record feeds the next planning call.
//! Progress streams out as events. The crate also provides the
//! context-window builder that fits chat history into a model's prompt
//! budget and the bridge that adapts blocking token streams to async
//! consumers.

pub mod context_window;
pub mod event;
pub mod iteration;
pub mod orchestrator;
pub mod prompts;
pub mod selector;
pub mod stream_bridge;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context_window::ContextWindowBuilder;
pub use event::ResearchEvent;
pub use iteration::IterationRecord;
pub use orchestrator::{ChannelStatusSink, ResearchOrchestrator, ResearchRequest, ToolExecutors};
pub use selector::{SelectionContext, ToolSelector};
pub use stream_bridge::StreamingBridge;
