//! Online search — queries a Serper-style search API.
//!
//! Returns a map from subquery to its organic hits; the webpage reader
//! later merges full page content into the same map entries.

use async_trait::async_trait;
use lorebase_core::error::ToolError;
use lorebase_core::profile::Location;
use lorebase_core::tool::{OnlineSearch, OrganicHit, StatusSink, WebResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// How many organic hits to keep per query.
const MAX_HITS: usize = 10;

pub struct OnlineSearchTool {
    client: reqwest::Client,
    search_url: String,
    api_key: String,
}

impl OnlineSearchTool {
    pub fn new(search_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            search_url: search_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl OnlineSearch for OnlineSearchTool {
    async fn search(
        &self,
        query: &str,
        location: Option<&Location>,
        sink: &dyn StatusSink,
    ) -> Result<BTreeMap<String, WebResult>, ToolError> {
        sink.send(format!("**Searching the web for:** {query}"));

        let mut body = serde_json::json!({ "q": query, "num": MAX_HITS });
        if let Some(loc) = location {
            if let Some(country) = &loc.country {
                body["gl"] = serde_json::json!(country);
            }
        }

        let response = self
            .client
            .post(&self.search_url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolError::Upstream(format!("search request failed: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Search API returned error");
            return Err(ToolError::Upstream(format!(
                "search API returned {status}: {error_body}"
            )));
        }

        let api_response: SearchApiResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("unparseable search response: {e}")))?;

        let organic: Vec<OrganicHit> = api_response
            .organic
            .into_iter()
            .take(MAX_HITS)
            .map(|hit| OrganicHit {
                title: hit.title,
                link: hit.link,
                snippet: hit.snippet,
            })
            .collect();

        debug!(query, hits = organic.len(), "Online search complete");
        sink.send(format!("**Found {} results online**", organic.len()));

        let mut results = BTreeMap::new();
        results.insert(
            query.to_string(),
            WebResult {
                organic,
                webpages: BTreeMap::new(),
            },
        );
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct SearchApiResponse {
    #[serde(default)]
    organic: Vec<ApiOrganicHit>,
}

#[derive(Debug, Deserialize)]
struct ApiOrganicHit {
    title: String,
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_search_response() {
        let data = r#"{
            "organic": [
                {"title": "Rust Book", "link": "https://doc.rust-lang.org/book/", "snippet": "Learn Rust."},
                {"title": "crates.io", "link": "https://crates.io/"}
            ]
        }"#;
        let parsed: SearchApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.organic.len(), 2);
        assert_eq!(parsed.organic[0].title, "Rust Book");
        assert!(parsed.organic[1].snippet.is_none());
    }

    #[test]
    fn parse_empty_response() {
        let parsed: SearchApiResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.organic.is_empty());
    }
}
