//! Web page loading for the document index.

use chrono::Utc;
use scraper::{Html, Selector};

use crate::types::{AppError, DocumentMetadata, Result, SourceDocument};

/// Elements whose text never reaches the index.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Fetches a page over HTTP and reduces it to its visible text.
#[derive(Clone)]
pub struct WebPageLoader {
    http: reqwest::Client,
}

impl WebPageLoader {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    #[tracing::instrument(skip(self))]
    pub async fn load(&self, url: &str) -> Result<SourceDocument> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::from_transport("Fetching source page failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Network(format!(
                "Fetching {} returned {}",
                url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::from_transport("Reading source page failed", e))?;

        let (title, content) = extract_text(&body);
        tracing::debug!(chars = content.len(), title = %title, "Loaded source page");

        Ok(SourceDocument {
            content,
            metadata: DocumentMetadata {
                source: url.to_string(),
                title,
                fetched_at: Utc::now(),
                chunk_index: 0,
            },
        })
    }
}

/// Returns the page title and its visible text, one text node per line.
pub fn extract_text(html: &str) -> (String, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default();

    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut lines: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        let line = text.trim();
        if !line.is_empty() {
            lines.push(line);
        }
    }

    (title, lines.join("\n"))
}
