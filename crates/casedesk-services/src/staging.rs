//! Temporary upload staging
//!
//! Validates a raw upload and turns it into a [`StagedFile`]. Nothing is
//! written to the blob store or the database here; promotion happens later in
//! [`crate::writer`].

use base64::{engine::general_purpose::STANDARD, Engine};
use casedesk_core::models::StagedFile;
use casedesk_core::validation::{is_usable_filename, synthesize_filename, UploadValidator};
use casedesk_core::AppError;
use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct StagingService {
    validator: UploadValidator,
}

impl StagingService {
    pub fn new(validator: UploadValidator) -> Self {
        Self { validator }
    }

    pub fn max_upload_size(&self) -> usize {
        self.validator.max_size()
    }

    /// Validate an upload and stage it.
    ///
    /// `display_name` wins over the multipart filename when it is usable;
    /// when neither is, a `temp_<millis>.<ext>` name is synthesized.
    pub fn stage(
        &self,
        display_name: Option<&str>,
        original_name: Option<&str>,
        content_type: &str,
        data: &[u8],
    ) -> Result<StagedFile, AppError> {
        self.validator.validate(content_type, data.len())?;

        let filename = display_name
            .filter(|n| is_usable_filename(n))
            .or(original_name.filter(|n| is_usable_filename(n)))
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| synthesize_filename(content_type, Utc::now().timestamp_millis()));

        let staged = StagedFile {
            temp_id: Uuid::new_v4().to_string(),
            filename,
            content_type: content_type.to_string(),
            size: data.len() as u64,
            file_buffer: STANDARD.encode(data),
        };

        tracing::info!(
            stage = "staging",
            outcome = "staged",
            temp_id = %staged.temp_id,
            filename = %staged.filename,
            content_type = %staged.content_type,
            size_bytes = staged.size,
            "Upload staged"
        );

        Ok(staged)
    }
}
