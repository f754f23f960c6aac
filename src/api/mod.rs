//! HTTP surface, built on axum.
//!
//! # Endpoints
//!
//! - `GET /` renders the question form
//! - `POST /` answers a form submission and renders the result page
//! - `POST /api/ask` answers a JSON request with an [`AskResponse`](crate::types::AskResponse)
//! - `GET /api/health` reports liveness and version
//! - `GET /api/openapi.json` serves the OpenAPI document
//!
//! Requests may carry their own API key; otherwise the server falls back to
//! the environment variable named by `llm.api_key_env`.

/// Request handlers for every endpoint.
pub mod handlers;
/// Router assembly and the OpenAPI document.
pub mod routes;
