//! End-to-end HTTP tests: the axum router over a scripted model and mocked
//! upstreams for the documentation page, embeddings and Wikipedia.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::mocks::{MockLLMFactory, answer, tool_turn};
use common::{SOURCE_PAGE, mount_embeddings, mount_source_page, mount_wikipedia, test_config};
use ragqa::agents::router::{RoutingPolicy, ToolLabel};
use ragqa::api::routes::create_router;
use ragqa::rag::IndexPolicy;
use ragqa::types::{AskResponse, HealthResponse};
use ragqa::{AppState, Assistant, ConfigManager, RagqaConfig};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NAPOLEON: &str = "Napoleon Bonaparte was a French military officer and statesman.";

fn app(config: RagqaConfig, factory: MockLLMFactory) -> TestServer {
    let config_manager = Arc::new(ConfigManager::from_config(config));
    let assistant = Assistant::new(
        Arc::clone(&config_manager),
        Arc::new(factory),
        reqwest::Client::new(),
    );
    let state = AppState {
        config_manager,
        assistant: Arc::new(assistant),
    };
    TestServer::new(create_router(state)).unwrap()
}

async fn upstreams() -> MockServer {
    let server = MockServer::start().await;
    mount_source_page(&server).await;
    mount_embeddings(&server).await;
    mount_wikipedia(&server, "Napoleon", NAPOLEON).await;
    server
}

fn langsmith_script() -> Vec<ragqa::llm::LLMResponse> {
    vec![
        tool_turn("call_1", "Langsmith_search", json!({"query": "What is LangSmith?"})),
        answer("  LangSmith is a platform for building production-grade LLM applications.  "),
    ]
}

fn wikipedia_script() -> Vec<ragqa::llm::LLMResponse> {
    vec![
        tool_turn("call_1", "wikipedia", json!({"query": "Napoleon"})),
        answer("Napoleon was a French military officer."),
    ]
}

// ============= Health & docs =============

#[tokio::test]
async fn test_health() {
    let server = app(RagqaConfig::default(), MockLLMFactory::new(vec![]));

    let response = server.get("/api/health").await;
    response.assert_status_ok();

    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_document() {
    let server = app(RagqaConfig::default(), MockLLMFactory::new(vec![]));

    let doc: Value = server.get("/api/openapi.json").await.json();
    assert!(doc["paths"]["/api/ask"]["post"].is_object());
    assert!(doc["paths"]["/api/health"]["get"].is_object());
    assert!(doc["components"]["schemas"]["AskResponse"].is_object());
}

// ============= JSON API =============

#[tokio::test]
async fn test_langsmith_query_shows_documents() {
    let upstream = upstreams().await;
    let factory = MockLLMFactory::new(langsmith_script());
    let credentials = Arc::clone(&factory.credentials);
    let server = app(test_config(&upstream), factory);

    let response = server
        .post("/api/ask")
        .json(&json!({"query": "What is Langsmith?", "api_key": "sk-request"}))
        .await;
    response.assert_status_ok();

    let body: AskResponse = response.json();
    assert_eq!(
        body.answer,
        "LangSmith is a platform for building production-grade LLM applications."
    );
    assert_eq!(body.tool_used, ToolLabel::DocumentSearch);
    assert!(body.show_documents);
    let documents = body.documents.unwrap();
    assert_eq!(documents.len(), 2);
    assert!(documents.iter().all(|d| d.metadata.source.ends_with("/docs")));
    assert_eq!(body.tools_invoked, vec!["Langsmith_search".to_string()]);
    assert_eq!(body.iterations, 2);
    assert_eq!(body.finish_reason, "stop");

    assert_eq!(*credentials.lock(), vec!["sk-request".to_string()]);
}

#[tokio::test]
async fn test_general_query_is_attributed_to_wikipedia() {
    let upstream = upstreams().await;
    let server = app(test_config(&upstream), MockLLMFactory::new(wikipedia_script()));

    let response = server
        .post("/api/ask")
        .json(&json!({"query": "Who was Napoleon?", "api_key": "sk-request"}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["tool_used"], "Wikipedia");
    assert_eq!(body["show_documents"], false);
    assert!(body.get("documents").is_none());
    assert_eq!(body["tools_invoked"], json!(["wikipedia"]));
}

#[tokio::test]
async fn test_arithmetic_query_is_attributed_to_calculator() {
    let upstream = upstreams().await;
    let factory = MockLLMFactory::new(vec![
        tool_turn("call_1", "Calculator", json!({"expression": "2+2"})),
        answer("2+2 is 4."),
    ]);
    let server = app(test_config(&upstream), factory);

    let body: AskResponse = server
        .post("/api/ask")
        .json(&json!({"query": "2+2", "api_key": "sk-request"}))
        .await
        .json();

    assert_eq!(body.tool_used, ToolLabel::Calculator);
    assert!(!body.show_documents);
    assert_eq!(body.answer, "2+2 is 4.");
}

#[tokio::test]
async fn test_legacy_policy_labels_everything_calculator() {
    let upstream = upstreams().await;
    let mut config = test_config(&upstream);
    config.router.policy = RoutingPolicy::Legacy;
    let server = app(config, MockLLMFactory::new(wikipedia_script()));

    let body: AskResponse = server
        .post("/api/ask")
        .json(&json!({"query": "Who was Napoleon?", "api_key": "sk-request"}))
        .await
        .json();

    assert_eq!(body.tool_used, ToolLabel::Calculator);
    assert!(!body.show_documents);
    assert_eq!(body.tools_invoked, vec!["wikipedia".to_string()]);
}

#[tokio::test]
async fn test_missing_key_is_unauthorized() {
    let upstream = upstreams().await;
    let server = app(test_config(&upstream), MockLLMFactory::new(wikipedia_script()));

    let response = server
        .post("/api/ask")
        .json(&json!({"query": "Who was Napoleon?", "api_key": "   "}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains(common::UNSET_KEY_ENV));
}

#[tokio::test]
async fn test_blank_query_is_bad_request() {
    let server = app(RagqaConfig::default(), MockLLMFactory::new(vec![]));

    let response = server
        .post("/api/ask")
        .json(&json!({"query": "  ", "api_key": "sk-request"}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = RagqaConfig::default();
    config.server.body_limit = 1024;
    let server = app(config, MockLLMFactory::new(wikipedia_script()));

    let response = server
        .post("/api/ask")
        .json(&json!({"query": "x".repeat(4096), "api_key": "sk-request"}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_rejected_key_is_unauthorized() {
    let upstream = upstreams().await;
    let server = app(
        test_config(&upstream),
        MockLLMFactory::rejecting("Incorrect API key provided"),
    );

    let response = server
        .post("/api/ask")
        .json(&json!({"query": "Who was Napoleon?", "api_key": "sk-bad"}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_source_page_outage_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&upstream)
        .await;
    let server = app(test_config(&upstream), MockLLMFactory::new(wikipedia_script()));

    let response = server
        .post("/api/ask")
        .json(&json!({"query": "Who was Napoleon?", "api_key": "sk-request"}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_cached_index_fetches_page_once() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SOURCE_PAGE, "text/html"))
        .expect(1)
        .mount(&upstream)
        .await;
    mount_embeddings(&upstream).await;
    mount_wikipedia(&upstream, "Napoleon", NAPOLEON).await;

    let mut config = test_config(&upstream);
    config.rag.index_policy = IndexPolicy::Cached;
    let server = app(config, MockLLMFactory::new(wikipedia_script()));

    for _ in 0..2 {
        server
            .post("/api/ask")
            .json(&json!({"query": "Who was Napoleon?", "api_key": "sk-request"}))
            .await
            .assert_status_ok();
    }
}

// ============= HTML form =============

#[tokio::test]
async fn test_form_page() {
    let server = app(RagqaConfig::default(), MockLLMFactory::new(vec![]));

    let page = server.get("/").await.text();
    assert!(page.contains("RAG-Powered Multi-Agent Q&A Assistant"));
    assert!(page.contains("Give your OpenAI API key"));
    assert!(page.contains("Type your query here"));
}

#[tokio::test]
async fn test_blank_form_submission_renders_empty_form() {
    let server = app(RagqaConfig::default(), MockLLMFactory::new(vec![]));

    let response = server
        .post("/")
        .form(&[("api_key", ""), ("query", "")])
        .await;
    response.assert_status_ok();

    let page = response.text();
    assert!(page.contains("Type your query here"));
    assert!(!page.contains("The Final answer"));
}

#[tokio::test]
async fn test_form_langsmith_answer() {
    let upstream = upstreams().await;
    let server = app(test_config(&upstream), MockLLMFactory::new(langsmith_script()));

    let response = server
        .post("/")
        .form(&[("api_key", "sk-request"), ("query", "What is Langsmith?")])
        .await;
    response.assert_status_ok();

    let page = response.text();
    assert!(page.contains("The Final answer"));
    assert!(page.contains("LangSmith is a platform for building production-grade LLM applications."));
    assert!(page.contains("Tool Used"));
    assert!(page.contains("Langsmith_search"));
    assert!(page.contains("Retrieved Documents"));
}

#[tokio::test]
async fn test_form_general_answer_hides_documents() {
    let upstream = upstreams().await;
    let server = app(test_config(&upstream), MockLLMFactory::new(wikipedia_script()));

    let page = server
        .post("/")
        .form(&[("api_key", "sk-request"), ("query", "Who was Napoleon?")])
        .await
        .text();

    assert!(page.contains("Napoleon was a French military officer."));
    assert!(page.contains("<p>Wikipedia</p>"));
    assert!(!page.contains("Retrieved Documents"));
}

#[tokio::test]
async fn test_form_error_is_rendered_in_page() {
    let mut config = RagqaConfig::default();
    config.llm.api_key_env = common::UNSET_KEY_ENV.to_string();
    let server = app(config, MockLLMFactory::new(vec![]));

    let response = server
        .post("/")
        .form(&[("api_key", ""), ("query", "Who was Napoleon?")])
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let page = response.text();
    assert!(page.contains("class=\"error\""));
    assert!(page.contains("Who was Napoleon?"));
}
