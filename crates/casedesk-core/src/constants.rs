//! Shared constants

/// Maximum staged upload size (10 MiB, inclusive).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Content types accepted at staging time.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/csv",
];

/// Blob-store prefix for promoted files.
pub const UPLOADS_PREFIX: &str = "uploads";

/// Client name recorded on files promoted without any client hint.
pub const UNASSIGNED_CLIENT: &str = "Unassigned";

/// Default similarity threshold for fuzzy client matching.
pub const DEFAULT_CLIENT_MATCH_THRESHOLD: f32 = 0.6;

/// Conversations held by the staging cache before LRU eviction.
pub const STAGING_CACHE_CAPACITY: usize = 256;

pub const STAGING_MAX_FILES_PER_CONVERSATION: usize = 20;

/// Base64 payload bytes held by the staging cache across all conversations.
pub const STAGING_CACHE_MAX_BYTES: usize = 512 * 1024 * 1024;

pub const API_PREFIX: &str = "/api/v0";
