//! Encyclopedia lookup over the MediaWiki action API
//!
//! A lookup searches for matching page titles, fetches the plain-text intro of
//! each page and joins them into one summary, truncated to a fixed number of
//! characters so the tool output stays small in the model's context.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use crate::utils::toml_config::WikipediaConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Output when the search finds no page.
pub const NO_RESULT_MESSAGE: &str = "No good Wikipedia Search Result was found";

pub struct WikipediaTool {
    http: reqwest::Client,
    config: WikipediaConfig,
}

impl WikipediaTool {
    pub fn new(http: reqwest::Client, config: WikipediaConfig) -> Self {
        Self { http, config }
    }

    /// Run a lookup and return the formatted, truncated summary.
    pub async fn run(&self, query: &str) -> Result<String> {
        let titles = self.search_titles(query).await?;
        if titles.is_empty() {
            return Ok(NO_RESULT_MESSAGE.to_string());
        }

        let mut summaries = Vec::with_capacity(titles.len());
        for title in &titles {
            if let Some(extract) = self.fetch_extract(title).await? {
                summaries.push(format!("Page: {}\nSummary: {}", title, extract));
            }
        }

        if summaries.is_empty() {
            return Ok(NO_RESULT_MESSAGE.to_string());
        }

        Ok(truncate_chars(
            &summaries.join("\n\n"),
            self.config.doc_content_chars_max,
        ))
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>> {
        let limit = self.config.top_k_results.to_string();
        let response = self
            .http
            .get(&self.config.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::from_transport("Wikipedia search failed", e))?;

        let body: SearchResponse = checked_json(response).await?;
        Ok(body
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn fetch_extract(&self, title: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(&self.config.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("titles", title),
            ])
            .send()
            .await
            .map_err(|e| AppError::from_transport("Wikipedia page fetch failed", e))?;

        let body: ExtractResponse = checked_json(response).await?;
        Ok(body
            .query
            .and_then(|q| q.pages.into_values().find_map(|page| page.extract))
            .map(|extract| extract.trim().to_string())
            .filter(|extract| !extract.is_empty()))
    }
}

async fn checked_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Tool(format!("Wikipedia returned {}", status)));
    }
    response
        .json()
        .await
        .map_err(|e| AppError::Tool(format!("Malformed Wikipedia response: {}", e)))
}

/// Truncate to at most `max` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "A wrapper around Wikipedia. Useful for when you need to answer general questions about \
         people, places, companies, facts, historical events, or other subjects. Input should be \
         a search query."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "query to look up on wikipedia"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'query' parameter".to_string()))?;

        Ok(Value::String(self.run(query).await?))
    }
}

// ============= Wire Types =============

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, ExtractPage>,
}

#[derive(Deserialize)]
struct ExtractPage {
    extract: Option<String>,
}
