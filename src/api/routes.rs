use crate::{
    AppState,
    agents::router::ToolLabel,
    api::handlers::{ask, form, health},
    types::{AskRequest, AskResponse, DocumentMetadata, HealthResponse, RetrievedDocument},
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "ragqa-server", description = "RAG-powered multi-tool Q&A assistant"),
    paths(ask::ask, health::health),
    components(schemas(
        AskRequest,
        AskResponse,
        HealthResponse,
        RetrievedDocument,
        DocumentMetadata,
        ToolLabel
    )),
    tags(
        (name = "ask", description = "Question answering"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config_manager.config().server.body_limit;

    let api_routes = Router::new()
        .route("/ask", post(ask::ask))
        .route("/health", get(health::health))
        .route("/openapi.json", get(openapi_json));

    Router::new()
        .route("/", get(form::index).post(form::submit))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
