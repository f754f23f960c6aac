use crate::{
    AppState,
    types::{ApiCredential, AskRequest, AskResponse, Result},
};
use axum::{Json, extract::State};

/// Answer a question with the tool-calling agent
#[utoipa::path(
    post,
    path = "/api/ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Answer with tool attribution", body = AskResponse),
        (status = 400, description = "Blank query"),
        (status = 401, description = "No usable API key"),
        (status = 502, description = "Upstream model, embeddings or tool failure"),
        (status = 504, description = "Upstream timeout")
    ),
    tag = "ask"
)]
pub async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let credential = ApiCredential::from_input(payload.api_key.as_deref());
    let outcome = state.assistant.ask(&payload.query, credential).await?;
    Ok(Json(outcome.into()))
}
