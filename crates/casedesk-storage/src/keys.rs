//! Shared key generation for storage backends.

use casedesk_core::constants::UPLOADS_PREFIX;
use casedesk_core::validation::sanitize_filename;

/// Storage key for a promoted file: `uploads/{filename}`.
///
/// The filename is reduced to a single safe path segment first, so a
/// display name like `../../etc/passwd` lands at `uploads/passwd`.
pub fn upload_key(filename: &str) -> String {
    format!("{}/{}", UPLOADS_PREFIX, sanitize_filename(filename))
}

/// Rejects keys that could escape the storage root.
pub(crate) fn is_safe_key(storage_key: &str) -> bool {
    !storage_key.is_empty() && !storage_key.contains("..") && !storage_key.starts_with('/')
}
