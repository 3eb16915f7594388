use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::file::StoredFile;

/// Result of a promotion batch.
///
/// `success` is true iff at least one file was stored. `skipped` counts
/// payloads rejected before any I/O, `failed` counts upload or metadata
/// failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreOutcome {
    pub success: bool,
    pub message: String,
    pub stored_files: Vec<StoredFile>,
    pub client_name: Option<String>,
    pub skipped: usize,
    pub failed: usize,
}

impl StoreOutcome {
    pub fn empty(message: impl Into<String>, client_name: Option<String>) -> Self {
        StoreOutcome {
            success: false,
            message: message.into(),
            stored_files: Vec::new(),
            client_name,
            skipped: 0,
            failed: 0,
        }
    }
}

/// Where the bridge found the files it reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// Recent durable rows for the client.
    DurableStore,
    /// Records supplied by the caller.
    ExistingFiles,
    /// Staged files promoted during this call.
    Promoted,
    /// Staged files awaiting promotion (read-only snapshot).
    Staged,
    /// Nothing found.
    None,
}

/// Ground-truth file state for one conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileContextReport {
    pub success: bool,
    pub source: ContextSource,
    pub message: String,
    pub files: Vec<StoredFile>,
    pub client_name: Option<String>,
}
