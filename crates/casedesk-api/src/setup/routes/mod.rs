//! Route configuration and setup.

mod health;

use crate::api_doc;
use crate::auth::{auth_middleware, AuthState};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use casedesk_core::constants::API_PREFIX;
use casedesk_core::validation::base64_encoded_len;
use casedesk_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

// Multipart framing on top of the largest accepted file
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
// Metadata fields around one base64 payload in a JSON promotion body
const JSON_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Per-route body limits. Uploads carry raw bytes; the promotion routes
/// carry the same file back as base64, which is a third larger.
#[derive(Debug, Clone, Copy)]
struct BodyLimits {
    upload: usize,
    promotion: usize,
}

impl BodyLimits {
    fn from_config(config: &Config) -> Self {
        let max = config.max_upload_size_bytes();
        Self {
            upload: max + MULTIPART_OVERHEAD_BYTES,
            promotion: base64_encoded_len(max) + JSON_OVERHEAD_BYTES,
        }
    }
}

/// Setup all application routes
pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState::new(config.jwt_secret()));

    let protected = protected_routes(BodyLimits::from_config(config)).layer(axum::middleware::from_fn_with_state(
        auth_state,
        auth_middleware,
    ));

    let app = public_routes()
        .merge(protected)
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(api_doc::get_openapi_spec()) }),
        )
}

fn protected_routes(limits: BodyLimits) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/files/upload", API_PREFIX),
            post(handlers::files::upload_file)
                .layer::<_, std::convert::Infallible>(RequestBodyLimitLayer::new(limits.upload))
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            &format!("{}/files/store", API_PREFIX),
            post(handlers::files::store_files).layer(DefaultBodyLimit::max(limits.promotion)),
        )
        .route(
            &format!("{}/files/context", API_PREFIX),
            post(handlers::files::file_context).layer(DefaultBodyLimit::max(limits.promotion)),
        )
        .route(
            &format!("{}/files", API_PREFIX),
            get(handlers::files::list_files),
        )
        .route(
            &format!("{}/conversations/{{id}}/staged", API_PREFIX),
            delete(handlers::files::clear_staged),
        )
        .route(&format!("{}/chat", API_PREFIX), post(handlers::chat::chat))
}

