//! Chat turn endpoint.

use crate::auth::SessionContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use casedesk_services::{ChatReply, ChatRequest};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/v0/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply with executed tool calls", body = ChatReply),
        (status = 400, description = "Invalid conversation", body = ErrorResponse),
        (status = 500, description = "Chat not configured", body = ErrorResponse),
        (status = 502, description = "Assistant provider failed", body = ErrorResponse)
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    ValidatedJson(mut request): ValidatedJson<ChatRequest>,
) -> Result<Json<ChatReply>, HttpAppError> {
    request.uploaded_by = Some(session.user_id);
    let reply = state.orchestrator.respond(request).await?;
    Ok(Json(reply))
}
