use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::validation::normalize_mime_type;

/// Association state of a durable file, fixed at promotion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "file_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// A registry client matched the hint.
    Assigned,
    /// No client matched; the file waits for manual association.
    TempQueue,
}

impl Display for FileStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileStatus::Assigned => write!(f, "assigned"),
            FileStatus::TempQueue => write!(f, "temp_queue"),
        }
    }
}

/// A promoted file: blob plus metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DurableFile {
    pub id: Uuid,
    pub client_name: String,
    pub status: FileStatus,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_url: String,
    pub storage_key: String,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a durable file row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDurableFile {
    pub id: Uuid,
    pub client_name: String,
    pub status: FileStatus,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_url: String,
    pub storage_key: String,
    pub uploaded_by: Option<Uuid>,
}

/// One entry of a store result, keyed by filename for callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredFile {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub size: i64,
    pub content_type: String,
    pub status: FileStatus,
    pub client_name: String,
}

impl From<DurableFile> for StoredFile {
    fn from(file: DurableFile) -> Self {
        StoredFile {
            id: file.id,
            name: file.file_name,
            url: file.file_url,
            size: file.file_size,
            content_type: file.file_type,
            status: file.status,
            client_name: file.client_name,
        }
    }
}

/// Coarse category used when describing files to the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Pdf,
    Image,
    Text,
    Document,
    File,
}

impl FileCategory {
    pub fn from_mime(content_type: &str) -> Self {
        let mime = normalize_mime_type(content_type).to_lowercase();
        if mime == "application/pdf" {
            FileCategory::Pdf
        } else if mime.starts_with("image/") {
            FileCategory::Image
        } else if mime.starts_with("text/") {
            FileCategory::Text
        } else if mime.contains("word")
            || mime.contains("officedocument")
            || mime.contains("msword")
            || mime.contains("excel")
            || mime.contains("spreadsheet")
            || mime.contains("opendocument")
        {
            FileCategory::Document
        } else {
            FileCategory::File
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::Pdf => "PDF",
            FileCategory::Image => "image",
            FileCategory::Text => "text",
            FileCategory::Document => "document",
            FileCategory::File => "file",
        }
    }
}
