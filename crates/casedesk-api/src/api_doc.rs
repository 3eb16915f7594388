//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use casedesk_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Casedesk API",
        version = "0.1.0",
        description = "File intake for the case-management assistant: staging uploads, promoting them to durable storage with client association, and reporting file state to the assistant. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::files::upload_file,
        handlers::files::store_files,
        handlers::files::file_context,
        handlers::files::list_files,
        handlers::files::clear_staged,
        handlers::chat::chat,
    ),
    components(
        schemas(
            models::StagedFile,
            models::FilePayload,
            models::DurableFile,
            models::FileStatus,
            models::StoredFile,
            models::StoreOutcome,
            models::ContextSource,
            models::FileContextReport,
            handlers::files::StoreFilesRequest,
            casedesk_services::ContextRequest,
            casedesk_services::ChatRequest,
            casedesk_services::ChatTurn,
            casedesk_services::ChatReply,
            casedesk_services::ToolExecution,
            casedesk_services::Role,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "files", description = "Upload staging, promotion and file context"),
        (name = "chat", description = "Assistant turns with file tools")
    )
)]
pub struct ApiDoc;
