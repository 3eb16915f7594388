//! Health check handler.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: &'static str,
    pub database: String,
    pub storage: String,
    pub chat: &'static str,
}

async fn database_status(state: &AppState) -> String {
    let Some(pool) = state.pool.as_ref() else {
        return "not_configured".to_string();
    };
    match tokio::time::timeout(CHECK_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => format!("unhealthy: {}", e),
        Err(_) => "timeout".to_string(),
    }
}

pub(super) async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = database_status(&state).await;
    let storage = match state.storage.as_ref() {
        Some(storage) => format!("{}", storage.backend_type()),
        None => "not_configured".to_string(),
    };
    let chat = if state.orchestrator.is_configured() {
        "configured"
    } else {
        "not_configured"
    };

    let degraded = database.starts_with("unhealthy") || database == "timeout";
    let (status_code, status) = if degraded {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    } else {
        (StatusCode::OK, "healthy")
    };

    (
        status_code,
        Json(HealthCheckResponse {
            status,
            database,
            storage,
            chat,
        }),
    )
}
