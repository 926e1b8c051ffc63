//! Tool executors for the Lorebase research loop.
//!
//! Each module implements one of the executor traits from `lorebase-core`:
//! notes search, online search, webpage reading, sandboxed code execution,
//! and single-file summarization. Storage and retrieval internals stay
//! behind the `DocumentIndex` and `DocumentStore` collaborator traits.

pub mod code;
pub mod notes;
pub mod online;
pub mod summarize;
pub mod webpage;

pub use code::CodeRunnerTool;
pub use notes::{DocumentIndex, InMemoryIndex, IndexHit, NotesSearchTool};
pub use online::OnlineSearchTool;
pub use summarize::{DocumentStore, FileSummarizerTool};
pub use webpage::WebpageReaderTool;
