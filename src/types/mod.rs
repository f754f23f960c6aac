use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::agents::router::ToolLabel;

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AskRequest {
    pub query: String,
    /// OpenAI API key for this request. Falls back to the configured env var.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AskResponse {
    pub request_id: String,
    pub answer: String,
    pub tool_used: ToolLabel,
    pub show_documents: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<RetrievedDocument>>,
    pub tools_invoked: Vec<String>,
    pub iterations: usize,
    pub finish_reason: String,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============= Credentials =============

/// Per-request API key for the hosted model and embeddings endpoints.
///
/// The key is never logged; `Debug` prints a redacted placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential(String);

impl ApiCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns `None` for blank input so form fields left empty fall through
    /// to the environment.
    pub fn from_input(key: Option<&str>) -> Option<Self> {
        key.map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| Self(k.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiCredential(***)")
    }
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= RAG Types =============

/// A fetched page before chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DocumentMetadata {
    pub source: String,
    pub title: String,
    pub fetched_at: DateTime<Utc>,
    /// Position of the chunk within its source page
    #[serde(default)]
    pub chunk_index: usize,
}

/// A chunk returned by the retriever, passed through unmodified for display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RetrievedDocument {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub score: f32,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify a transport-level failure from `reqwest`.
    pub fn from_transport(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(format!("{}: {}", context, err))
        } else {
            AppError::Network(format!("{}: {}", context, err))
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Network(_) | AppError::Tool(_) | AppError::LLM(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = ApiCredential::new("sk-secret");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("sk-secret"));
        assert_eq!(credential.expose(), "sk-secret");
    }

    #[test]
    fn test_credential_from_blank_input() {
        assert!(ApiCredential::from_input(None).is_none());
        assert!(ApiCredential::from_input(Some("   ")).is_none());
        assert_eq!(
            ApiCredential::from_input(Some(" sk-1 ")).unwrap().expose(),
            "sk-1"
        );
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::Auth("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Network("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Timeout("x".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Config("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
