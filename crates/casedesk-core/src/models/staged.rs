use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An upload held in session-scoped storage until it is promoted.
///
/// `file_buffer` is the base64-encoded payload. Nothing here has touched the
/// blob store yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StagedFile {
    pub temp_id: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub file_buffer: String,
}

/// A file payload submitted for promotion.
///
/// Every field is optional on the wire: the writer decides per item whether a
/// payload is usable instead of rejecting the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilePayload {
    #[serde(default)]
    pub temp_id: Option<String>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub file_buffer: Option<String>,
}

impl From<StagedFile> for FilePayload {
    fn from(staged: StagedFile) -> Self {
        FilePayload {
            temp_id: Some(staged.temp_id),
            filename: staged.filename,
            content_type: staged.content_type,
            size: staged.size,
            file_buffer: Some(staged.file_buffer),
        }
    }
}
