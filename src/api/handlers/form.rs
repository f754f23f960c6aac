//! The single-page question form.
//!
//! The page has two inputs, the API key and the query. Submitting a blank
//! query renders the empty form again; anything else runs the assistant and
//! renders the answer, the tool it is attributed to and, for document-search
//! answers, the retrieved documents.

use crate::{
    AppState,
    agents::assistant::AskOutcome,
    types::{ApiCredential, AppError, RetrievedDocument},
};
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

const PAGE_TITLE: &str = "RAG-Powered Multi-Agent Q&A Assistant";

#[derive(Debug, Default, Deserialize)]
pub struct FormSubmission {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

pub async fn index() -> Html<String> {
    Html(render_page("", None))
}

pub async fn submit(State(state): State<AppState>, Form(form): Form<FormSubmission>) -> Response {
    let query = form.query.unwrap_or_default();
    if query.trim().is_empty() {
        return Html(render_page("", None)).into_response();
    }

    let credential = ApiCredential::from_input(form.api_key.as_deref());
    match state.assistant.ask(&query, credential).await {
        Ok(outcome) => Html(render_page(&query, Some(render_answer(&outcome)))).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "Form submission failed");
            let page = render_page(&query, Some(render_error(&err)));
            (err.status_code(), Html(page)).into_response()
        }
    }
}

fn render_page(query: &str, result: Option<String>) -> String {
    let mut page = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
label {{ display: block; margin-top: 1rem; }}
input {{ width: 100%; padding: 0.4rem; }}
pre {{ white-space: pre-wrap; background: #f5f5f5; padding: 0.6rem; }}
.error {{ color: #b00020; }}
</style>
</head>
<body>
<h1>{title}</h1>
<form method="post" action="/">
<label for="api_key">Give your OpenAI API key</label>
<input type="password" id="api_key" name="api_key" autocomplete="off">
<label for="query">Type your query here</label>
<input type="text" id="query" name="query" value="{query}">
<button type="submit">Ask</button>
</form>
"#,
        title = PAGE_TITLE,
        query = escape_html(query),
    );

    if let Some(result) = result {
        page.push_str(&result);
    }
    page.push_str("</body>\n</html>\n");
    page
}

fn render_answer(outcome: &AskOutcome) -> String {
    let mut html = format!(
        "<h2>The Final answer</h2>\n<p>{}</p>\n<h3>Tool Used</h3>\n<p>{}</p>\n",
        escape_html(&outcome.attribution.answer),
        escape_html(outcome.attribution.label.as_str()),
    );

    if outcome.attribution.show_documents() {
        html.push_str("<h3>Retrieved Documents</h3>\n");
        html.push_str(&render_documents(
            outcome.documents.as_deref().unwrap_or_default(),
        ));
    }
    html
}

fn render_documents(documents: &[RetrievedDocument]) -> String {
    if documents.is_empty() {
        return "<p>No documents retrieved.</p>\n".to_string();
    }

    let mut html = String::from("<ol>\n");
    for doc in documents {
        html.push_str(&format!(
            "<li><small>{} (chunk {}, score {:.3})</small><pre>{}</pre></li>\n",
            escape_html(&doc.metadata.source),
            doc.metadata.chunk_index,
            doc.score,
            escape_html(&doc.content),
        ));
    }
    html.push_str("</ol>\n");
    html
}

fn render_error(err: &AppError) -> String {
    format!("<p class=\"error\">{}</p>\n", escape_html(&err.to_string()))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
