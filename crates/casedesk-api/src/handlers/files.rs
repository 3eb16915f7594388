//! File staging, promotion, context and listing endpoints.

use crate::auth::SessionContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use casedesk_core::models::{
    DurableFile, FileContextReport, FilePayload, StagedFile, StoreOutcome,
};
use casedesk_core::AppError;
use casedesk_services::{ContextRequest, ConversationKey, StoreRequest};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

const MAX_LIST_LIMIT: i64 = 100;
const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StoreFilesRequest {
    #[serde(default)]
    pub files: Vec<FilePayload>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub client_name: Option<String>,
    /// When `files` is empty, the conversation's staged files are promoted.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct ListFilesQuery {
    #[validate(length(min = 1, max = 255))]
    pub client_name: String,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn multipart_error(e: impl std::fmt::Display) -> HttpAppError {
    HttpAppError(AppError::InvalidInput(format!(
        "Invalid multipart body: {}",
        e
    )))
}

/// Stage an upload for later promotion.
#[utoipa::path(
    post,
    path = "/api/v0/files/upload",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File staged", body = StagedFile),
        (status = 400, description = "Disallowed type, bad size, missing file or staging limit reached", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    mut multipart: Multipart,
) -> Result<Json<StagedFile>, HttpAppError> {
    let mut upload: Option<(Option<String>, String, Vec<u8>)> = None;
    let mut display_name = None;
    let mut conversation_id = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(String::from);
        match name.as_deref() {
            Some("file") => {
                let original_name = field.file_name().map(String::from);
                let content_type = field
                    .content_type()
                    .unwrap_or(UNKNOWN_CONTENT_TYPE)
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                upload = Some((original_name, content_type, data.to_vec()));
            }
            Some("filename") => {
                display_name = non_blank(Some(field.text().await.map_err(multipart_error)?));
            }
            Some("conversation_id") => {
                conversation_id = non_blank(Some(field.text().await.map_err(multipart_error)?));
            }
            _ => {}
        }
    }

    let (original_name, content_type, data) = upload.ok_or_else(|| {
        HttpAppError(AppError::InvalidInput(
            "Missing 'file' field in multipart body".to_string(),
        ))
    })?;

    let staged = state.staging.stage(
        display_name.as_deref(),
        original_name.as_deref(),
        &content_type,
        &data,
    )?;

    if let Some(conversation_id) = conversation_id.as_deref() {
        let key = ConversationKey::new(Some(session.user_id), conversation_id);
        state.cache.push(&key, staged.clone()).await?;
    }
    tracing::debug!(
        user_id = %session.user_id,
        temp_id = %staged.temp_id,
        cached = conversation_id.is_some(),
        "Upload staged"
    );

    Ok(Json(staged))
}

/// Promote staged files to durable storage.
#[utoipa::path(
    post,
    path = "/api/v0/files/store",
    tag = "files",
    request_body = StoreFilesRequest,
    responses(
        (status = 200, description = "Promotion outcome (success may be false)", body = StoreOutcome),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Blob storage not configured", body = ErrorResponse)
    )
)]
pub async fn store_files(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    ValidatedJson(request): ValidatedJson<StoreFilesRequest>,
) -> Result<Json<StoreOutcome>, HttpAppError> {
    request.validate()?;
    let conversation = non_blank(request.conversation_id)
        .map(|id| ConversationKey::new(Some(session.user_id), id));

    let files = match (request.files.is_empty(), conversation.as_ref()) {
        (true, Some(key)) => state
            .cache
            .files(key)
            .await
            .into_iter()
            .map(FilePayload::from)
            .collect(),
        _ => request.files,
    };

    let outcome = state
        .writer
        .store(StoreRequest {
            files,
            client_name: request.client_name,
            uploaded_by: Some(session.user_id),
        })
        .await?;

    if let Some(key) = conversation.as_ref() {
        let promoted: Vec<String> = outcome
            .stored_files
            .iter()
            .map(|f| f.id.to_string())
            .collect();
        if !promoted.is_empty() {
            state.cache.remove(key, &promoted).await;
        }
    }

    Ok(Json(outcome))
}

/// Ground-truth file state for a conversational turn.
#[utoipa::path(
    post,
    path = "/api/v0/files/context",
    tag = "files",
    request_body = ContextRequest,
    responses(
        (status = 200, description = "File context report", body = FileContextReport),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Blob storage not configured", body = ErrorResponse)
    )
)]
pub async fn file_context(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    ValidatedJson(mut request): ValidatedJson<ContextRequest>,
) -> Result<Json<FileContextReport>, HttpAppError> {
    request.uploaded_by = Some(session.user_id);
    let report = state.bridge.report(request).await?;
    Ok(Json(report))
}

/// Stored files for a client, newest first.
#[utoipa::path(
    get,
    path = "/api/v0/files",
    tag = "files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "Stored files", body = Vec<DurableFile>),
        (status = 400, description = "Missing client name", body = ErrorResponse)
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    _session: SessionContext,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<Vec<DurableFile>>, HttpAppError> {
    query.validate()?;
    let client_name = query.client_name.trim();
    if client_name.is_empty() {
        return Err(AppError::InvalidInput("client_name must not be blank".to_string()).into());
    }

    let limit = query
        .limit
        .unwrap_or_else(|| state.config.recent_files_limit())
        .clamp(1, MAX_LIST_LIMIT);
    let files = state
        .records
        .list_for_client(client_name, None, limit)
        .await?;
    Ok(Json(files))
}

/// Drop every staged file the caller holds for a conversation.
#[utoipa::path(
    delete,
    path = "/api/v0/conversations/{id}/staged",
    tag = "files",
    params(("id" = String, Path, description = "Conversation id")),
    responses(
        (status = 204, description = "Staged files cleared"),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    )
)]
pub async fn clear_staged(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Path(conversation_id): Path<String>,
) -> StatusCode {
    let key = ConversationKey::new(Some(session.user_id), conversation_id.as_str());
    let dropped = state.cache.clear(&key).await;
    tracing::debug!(conversation_id = %conversation_id, dropped, "Staged files cleared");
    StatusCode::NO_CONTENT
}
