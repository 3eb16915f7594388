//! Casedesk Storage Library
//!
//! Blob storage abstraction for promoted files, with S3-compatible and local
//! filesystem implementations.
//!
//! # Storage key format
//!
//! Every promoted file lives at `uploads/{filename}`. The layout is flat, so
//! two promotions with the same filename write to the same object and the
//! later one wins. Keys must not contain `..` or a leading `/`; key
//! generation is centralized in the `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use casedesk_core::StorageBackend;
pub use factory::create_storage;
pub use keys::upload_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
