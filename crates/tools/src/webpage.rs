//! Webpage reader — fetches and strips specific pages named in the query.
//!
//! URLs are pulled straight out of the generated query text. Each page is
//! fetched, reduced to visible text, and returned under the query's map
//! entry so the orchestrator can merge it into the online results.

use async_trait::async_trait;
use lorebase_core::error::ToolError;
use lorebase_core::tool::{StatusSink, WebResult, WebpageReader};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-page content cap, in characters.
const MAX_PAGE_CHARS: usize = 10_000;

pub struct WebpageReaderTool {
    client: reqwest::Client,
}

impl WebpageReaderTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for WebpageReaderTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebpageReader for WebpageReaderTool {
    async fn read(
        &self,
        query: &str,
        sink: &dyn StatusSink,
    ) -> Result<BTreeMap<String, WebResult>, ToolError> {
        let urls = extract_urls(query);
        if urls.is_empty() {
            return Err(ToolError::InvalidArguments(format!(
                "no URLs found in query: {query}"
            )));
        }

        sink.send(format!("**Reading {} webpage(s)**", urls.len()));

        let mut webpages = BTreeMap::new();
        for url in urls {
            match self.fetch_page(&url).await {
                Ok(text) => {
                    debug!(url, chars = text.len(), "Fetched webpage");
                    webpages.insert(url, text);
                }
                Err(e) => {
                    // A single unreachable page should not sink the rest.
                    warn!(url, error = %e, "Failed to read webpage");
                }
            }
        }

        let mut results = BTreeMap::new();
        results.insert(
            query.to_string(),
            WebResult {
                organic: Vec::new(),
                webpages,
            },
        );
        Ok(results)
    }
}

impl WebpageReaderTool {
    async fn fetch_page(&self, url: &str) -> Result<String, ToolError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::Upstream(format!("fetch failed: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(ToolError::Upstream(format!("page returned {status}")));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ToolError::Upstream(format!("body read failed: {e}")))?;

        let mut text = strip_html(&html);
        truncate_chars(&mut text, MAX_PAGE_CHARS);
        Ok(text)
    }
}

/// Truncate to at most `max` characters. `String::truncate` takes a byte
/// index, so the cut point has to land on a char boundary.
fn truncate_chars(text: &mut String, max: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
    }
}

/// Pull http(s) URLs out of free text, trimming trailing punctuation.
pub fn extract_urls(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|w| w.starts_with("http://") || w.starts_with("https://"))
        .map(|w| w.trim_end_matches(['.', ',', ')', ']', '"', '\'']).to_string())
        .collect()
}

/// Reduce HTML to visible text: drop script/style blocks and tags,
/// collapse whitespace runs.
fn strip_html(html: &str) -> String {
    let cleaned = remove_blocks(html, "<script", "</script>");
    let cleaned = remove_blocks(&cleaned, "<style", "</style>");

    let mut out = String::with_capacity(cleaned.len() / 4);
    let mut in_tag = false;
    for c in cleaned.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove every `open`..`close` span, case-insensitively. An unterminated
/// block is dropped through end of input.
fn remove_blocks(html: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    loop {
        match find_ascii_ci(rest, open) {
            Some(start) => {
                out.push_str(&rest[..start]);
                let after = &rest[start..];
                match find_ascii_ci(after, close) {
                    Some(end) => rest = &after[end + close.len()..],
                    None => break,
                }
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    out
}

/// Byte offset of an ASCII needle, ignoring ASCII case.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}
