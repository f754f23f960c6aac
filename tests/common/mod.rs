//! Shared fixtures for the integration suites.
//!
//! A single wiremock server stands in for every upstream: the documentation
//! page, the embeddings endpoint, the chat completions endpoint and the
//! MediaWiki API.

#![allow(dead_code)]

pub mod mocks;

use ragqa::RagqaConfig;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Env var that no test ever sets, so credential fallback always misses.
pub const UNSET_KEY_ENV: &str = "RAGQA_TEST_UNSET_API_KEY";

pub const SOURCE_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Get started with LangSmith</title><script>window.analytics = {};</script></head>
  <body>
    <h1>LangSmith</h1>
    <p>LangSmith is a platform for building production-grade LLM applications.</p>
    <h2>Tracing</h2>
    <p>Tracing records every run of your application so you can debug tracing issues quickly.</p>
    <h2>Evaluation</h2>
    <p>Evaluation lets you score runs against datasets and compare evaluation results over time.</p>
  </body>
</html>"#;

/// Deterministic embedding: keyword counts plus a bias so no vector is zero.
pub fn embed_text(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut vector: Vec<f32> = ["langsmith", "tracing", "evaluation"]
        .iter()
        .map(|k| lower.matches(k).count() as f32)
        .collect();
    vector.push(0.1);
    vector
}

/// Answers `/embeddings` requests with one [`embed_text`] vector per input.
pub struct EmbeddingResponder;

impl Respond for EmbeddingResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let data: Vec<Value> = body["input"]
            .as_array()
            .map(|inputs| {
                inputs
                    .iter()
                    .enumerate()
                    .map(|(index, input)| {
                        json!({
                            "object": "embedding",
                            "index": index,
                            "embedding": embed_text(input.as_str().unwrap_or_default()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": data,
            "model": body["model"],
            "usage": {"prompt_tokens": 8, "total_tokens": 8},
        }))
    }
}

pub async fn mount_source_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SOURCE_PAGE, "text/html"))
        .mount(server)
        .await;
}

pub async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(EmbeddingResponder)
        .mount(server)
        .await;
}

pub async fn mount_wikipedia(server: &MockServer, title: &str, extract: &str) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": "",
            "query": {"search": [{"ns": 0, "title": title, "pageid": 69880}]}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "extracts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchcomplete": "",
            "query": {"pages": {"69880": {"pageid": 69880, "title": title, "extract": extract}}}
        })))
        .mount(server)
        .await;
}

/// Chat completions body with a plain answer.
pub fn chat_answer(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-3.5-turbo-0125",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
    })
}

/// Chat completions body requesting one tool call.
pub fn chat_tool_call(id: &str, name: &str, arguments: Value) -> Value {
    json!({
        "id": "chatcmpl-2",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-3.5-turbo-0125",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": id,
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

/// Configuration pointing every upstream at the mock server.
pub fn test_config(server: &MockServer) -> RagqaConfig {
    let mut config = RagqaConfig::default();
    config.llm.api_base = format!("{}/v1", server.uri());
    config.llm.api_key_env = UNSET_KEY_ENV.to_string();
    config.llm.timeout_secs = 5;
    config.rag.source_url = format!("{}/docs", server.uri());
    config.rag.chunk_size = 120;
    config.rag.chunk_overlap = 20;
    config.rag.top_k = 2;
    config.tools.wikipedia.api_url = format!("{}/w/api.php", server.uri());
    config
}
