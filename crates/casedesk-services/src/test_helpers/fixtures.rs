//! Payload and record builders shared by tests.

use base64::{engine::general_purpose::STANDARD, Engine};
use casedesk_core::models::{DurableFile, FilePayload, FileStatus, StoredFile};
use chrono::Utc;
use uuid::Uuid;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A promotable payload carrying `size` bytes of filler.
pub fn payload(filename: &str, content_type: &str, size: usize) -> FilePayload {
    let data = vec![b'x'; size];
    FilePayload {
        temp_id: Some(Uuid::new_v4().to_string()),
        filename: filename.to_string(),
        content_type: content_type.to_string(),
        size: size as u64,
        file_buffer: Some(STANDARD.encode(&data)),
    }
}

/// A payload whose buffer is missing.
pub fn payload_without_buffer(filename: &str, content_type: &str, size: usize) -> FilePayload {
    FilePayload {
        file_buffer: None,
        ..payload(filename, content_type, size)
    }
}

pub fn durable_file(client_name: &str, file_name: &str, file_type: &str) -> DurableFile {
    DurableFile {
        id: Uuid::new_v4(),
        client_name: client_name.to_string(),
        status: FileStatus::Assigned,
        file_name: file_name.to_string(),
        file_type: file_type.to_string(),
        file_size: 1024,
        file_url: format!("https://blobs.test/uploads/{}", file_name),
        storage_key: format!("uploads/{}", file_name),
        uploaded_by: None,
        created_at: Utc::now(),
    }
}

pub fn stored_file(client_name: &str, file_name: &str, file_type: &str) -> StoredFile {
    durable_file(client_name, file_name, file_type).into()
}
