//! Notes search — queries the user's personal document index.
//!
//! The embedding and retrieval machinery lives behind the `DocumentIndex`
//! trait; this tool only shapes queries and results. `InMemoryIndex` is a
//! keyword implementation for tests and demos.

use async_trait::async_trait;
use lorebase_core::chat::ChatLog;
use lorebase_core::error::ToolError;
use lorebase_core::profile::Location;
use lorebase_core::tool::{NotesSearch, Reference, StatusSink};
use std::sync::Arc;
use tracing::debug;

/// How many hits a single search may return.
const MAX_RESULTS: usize = 10;

/// The retrieval subsystem behind notes search.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Return passages relevant to `query`, restricted to `file_filters`
    /// when non-empty.
    async fn query(
        &self,
        query: &str,
        file_filters: &[String],
        max_results: usize,
    ) -> Result<Vec<IndexHit>, ToolError>;
}

/// One passage returned by the index.
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub compiled: String,
    pub file: String,
}

pub struct NotesSearchTool {
    index: Arc<dyn DocumentIndex>,
}

impl NotesSearchTool {
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl NotesSearch for NotesSearchTool {
    async fn search(
        &self,
        query: &str,
        _chat_log: &ChatLog,
        file_filters: &[String],
        _location: Option<&Location>,
        sink: &dyn StatusSink,
    ) -> Result<Vec<Reference>, ToolError> {
        sink.send(format!("**Searching notes for:** {query}"));

        let hits = self.index.query(query, file_filters, MAX_RESULTS).await?;
        debug!(query, hits = hits.len(), "Notes search complete");

        // Dedup on passage text; the index may return overlapping chunks.
        let mut seen = std::collections::HashSet::new();
        let references: Vec<Reference> = hits
            .into_iter()
            .filter(|h| seen.insert(h.compiled.clone()))
            .map(|h| Reference {
                query: query.to_string(),
                compiled: h.compiled,
                file: h.file,
            })
            .collect();

        if references.is_empty() {
            sink.send("**No relevant notes found**".to_string());
        } else {
            sink.send(format!("**Found {} relevant passages**", references.len()));
        }

        Ok(references)
    }
}

/// A keyword index over in-memory documents.
///
/// Scores each document by the number of query words it contains and
/// returns the matching documents as whole-passage hits.
#[derive(Default)]
pub struct InMemoryIndex {
    documents: Vec<(String, String)>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: impl Into<String>, content: impl Into<String>) {
        self.documents.push((file.into(), content.into()));
    }
}

#[async_trait]
impl DocumentIndex for InMemoryIndex {
    async fn query(
        &self,
        query: &str,
        file_filters: &[String],
        max_results: usize,
    ) -> Result<Vec<IndexHit>, ToolError> {
        let words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();

        let mut scored: Vec<(usize, IndexHit)> = self
            .documents
            .iter()
            .filter(|(file, _)| file_filters.is_empty() || file_filters.iter().any(|f| file.contains(f.as_str())))
            .filter_map(|(file, content)| {
                let haystack = content.to_lowercase();
                let score = words.iter().filter(|w| haystack.contains(w.as_str())).count();
                (score > 0).then(|| {
                    (
                        score,
                        IndexHit {
                            compiled: content.clone(),
                            file: file.clone(),
                        },
                    )
                })
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().take(max_results).map(|(_, h)| h).collect())
    }
}
