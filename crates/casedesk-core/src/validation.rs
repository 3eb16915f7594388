//! Upload validation
//!
//! Allow-list and size checks applied at staging time, plus the filename
//! helpers shared by staging and the durable writer.

use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

use crate::constants::{ALLOWED_CONTENT_TYPES, MAX_UPLOAD_SIZE_BYTES};

const MAX_FILENAME_LENGTH: usize = 255;

static TEST_FIXTURE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(test|dummy|sample|placeholder|fixture)([-_ .]?(file|upload|doc|document|image)?[-_ ]?\d*)?$")
        .expect("fixture pattern is valid")
});

/// Which constraint an upload violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    Size,
    Type,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("File is empty")]
    EmptyFile,

    #[error("Unsupported content type: {content_type}")]
    UnsupportedType { content_type: String },

    #[error("Request body exceeds the size limit for staged file payloads")]
    BodyTooLarge,
}

impl UploadValidationError {
    pub fn kind(&self) -> ValidationKind {
        match self {
            UploadValidationError::FileTooLarge { .. }
            | UploadValidationError::EmptyFile
            | UploadValidationError::BodyTooLarge => ValidationKind::Size,
            UploadValidationError::UnsupportedType { .. } => ValidationKind::Type,
        }
    }
}

/// Size and content-type gate for staged uploads.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_size: usize,
    allowed_content_types: Vec<String>,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(MAX_UPLOAD_SIZE_BYTES)
    }
}

impl UploadValidator {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            allowed_content_types: ALLOWED_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn validate_content_type(&self, content_type: &str) -> Result<(), UploadValidationError> {
        let normalized = normalize_mime_type(content_type).to_lowercase();
        if !self.allowed_content_types.iter().any(|ct| *ct == normalized) {
            return Err(UploadValidationError::UnsupportedType {
                content_type: content_type.to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_size(&self, size: usize) -> Result<(), UploadValidationError> {
        if size == 0 {
            return Err(UploadValidationError::EmptyFile);
        }
        if size > self.max_size {
            return Err(UploadValidationError::FileTooLarge {
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    /// Type is checked before size, so a disallowed type is reported as such
    /// whatever its size.
    pub fn validate(&self, content_type: &str, size: usize) -> Result<(), UploadValidationError> {
        self.validate_content_type(content_type)?;
        self.validate_size(size)
    }
}

/// Length of the padded base64 encoding of `raw_len` bytes.
pub fn base64_encoded_len(raw_len: usize) -> usize {
    raw_len.div_ceil(3) * 4
}

/// Strip MIME parameters (e.g. "text/csv; charset=utf-8" -> "text/csv").
pub fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Preferred file extension for an allow-listed content type.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    match normalize_mime_type(content_type).to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "application/pdf" => "pdf",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "text/csv" => "csv",
        _ => "bin",
    }
}

/// `temp_<unix-millis>.<ext>` for uploads without a usable name.
pub fn synthesize_filename(content_type: &str, timestamp_millis: i64) -> String {
    format!(
        "temp_{}.{}",
        timestamp_millis,
        extension_for_content_type(content_type)
    )
}

/// A display name is usable when it has a non-blank stem after trimming.
pub fn is_usable_filename(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed != "blob" && trimmed != "unknown" && !trimmed.starts_with('.')
}

/// Reduce a filename to a single safe path segment for the blob store.
pub fn sanitize_filename(filename: &str) -> String {
    let filename_only = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = sanitized.replace("..", "_");
    if sanitized.trim_matches(|c| c == '.' || c == '_').is_empty() {
        return "file".to_string();
    }
    sanitized
}

/// Heuristic for placeholder payloads that agents and test harnesses submit
/// (`test.pdf`, `dummy_file.txt`, `sample-document.docx`).
pub fn is_test_fixture(filename: &str) -> bool {
    let stem = Path::new(filename.trim())
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    TEST_FIXTURE_NAME.is_match(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

    #[test]
    fn test_exactly_max_size_passes_and_one_more_byte_fails() {
        let validator = UploadValidator::default();
        assert!(validator.validate("application/pdf", 10 * 1024 * 1024).is_ok());

        let err = validator
            .validate("application/pdf", 10 * 1024 * 1024 + 1)
            .unwrap_err();
        assert_eq!(err.kind(), ValidationKind::Size);
    }

    #[test]
    fn test_zip_is_rejected_as_type_regardless_of_size() {
        let validator = UploadValidator::default();
        for size in [1, 1024, 10 * 1024 * 1024 + 1, 50 * 1024 * 1024] {
            let err = validator.validate("application/zip", size).unwrap_err();
            assert_eq!(err.kind(), ValidationKind::Type);
        }
    }

    #[test]
    fn test_allow_list_accepts_every_supported_type() {
        let validator = UploadValidator::default();
        for ct in [
            "image/jpeg",
            "image/png",
            "application/pdf",
            "application/msword",
            DOCX,
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "text/csv; charset=utf-8",
        ] {
            assert!(validator.validate(ct, 100).is_ok(), "{ct} should be allowed");
        }
    }

    #[test]
    fn test_empty_file_is_a_size_violation() {
        let err = UploadValidator::default().validate("image/png", 0).unwrap_err();
        assert_eq!(err, UploadValidationError::EmptyFile);
        assert_eq!(err.kind(), ValidationKind::Size);
    }

    #[test]
    fn test_base64_length_includes_padding() {
        assert_eq!(base64_encoded_len(0), 0);
        assert_eq!(base64_encoded_len(1), 4);
        assert_eq!(base64_encoded_len(3), 4);
        assert_eq!(base64_encoded_len(4), 8);
        assert_eq!(base64_encoded_len(10 * 1024 * 1024), 13_981_016);
    }

    #[test]
    fn test_synthesized_names_use_mime_extension() {
        assert_eq!(synthesize_filename(DOCX, 1700000000000), "temp_1700000000000.docx");
        assert_eq!(synthesize_filename("image/jpeg", 5), "temp_5.jpg");
        assert_eq!(synthesize_filename("text/csv", 5), "temp_5.csv");
    }

    #[test]
    fn test_sanitize_keeps_plain_names_and_flattens_paths() {
        assert_eq!(sanitize_filename("document.docx"), "document.docx");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("Sally Smith retainer.pdf"), "Sally_Smith_retainer.pdf");
        assert_eq!(sanitize_filename(".."), "file");
    }

    #[test]
    fn test_fixture_detection() {
        assert!(is_test_fixture("test.pdf"));
        assert!(is_test_fixture("dummy_file.txt"));
        assert!(is_test_fixture("sample-document.docx"));
        assert!(is_test_fixture("Test File 2.png"));
        assert!(!is_test_fixture("document.docx"));
        assert!(!is_test_fixture("testimony_smith.pdf"));
        assert!(!is_test_fixture("bank_statement_march.xlsx"));
    }
}
