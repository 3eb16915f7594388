//! Casedesk Core Library
//!
//! Domain models, error types, configuration and upload validation shared by
//! every casedesk component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{AssistantConfig, BaseConfig, Config};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
pub use validation::{UploadValidationError, UploadValidator, ValidationKind};
// Storage, StorageError and StorageResult live in casedesk-storage
