//! Durable file store writer
//!
//! Promotes staged payloads: blob upload under `uploads/<filename>`, client
//! association, then one metadata row per file. Items are processed one at a
//! time in submission order. A failing item is logged and dropped; the rest
//! of the batch carries on.

use base64::{engine::general_purpose::STANDARD, Engine};
use casedesk_core::models::{
    DurableFile, FilePayload, FileStatus, NewDurableFile, StoreOutcome, StoredFile,
};
use casedesk_core::validation::{is_test_fixture, is_usable_filename, synthesize_filename};
use casedesk_core::AppError;
use casedesk_db::FileRecordStore;
use casedesk_storage::{upload_key, Storage};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::resolver::{ClientResolver, Resolution};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
// 8-4-4-4-12 hyphenated form
const CANONICAL_UUID_LEN: usize = 36;

/// A promotion request.
#[derive(Debug, Clone, Default)]
pub struct StoreRequest {
    pub files: Vec<FilePayload>,
    pub client_name: Option<String>,
    pub uploaded_by: Option<Uuid>,
}

/// A payload that passed pre-flight checks.
struct ValidFile {
    temp_id: Option<String>,
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct FileStoreWriter {
    storage: Option<Arc<dyn Storage>>,
    records: Arc<dyn FileRecordStore>,
    resolver: ClientResolver,
}

impl FileStoreWriter {
    pub fn new(
        storage: Option<Arc<dyn Storage>>,
        records: Arc<dyn FileRecordStore>,
        resolver: ClientResolver,
    ) -> Self {
        Self {
            storage,
            records,
            resolver,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.storage.is_some()
    }

    /// Promote a batch of payloads.
    ///
    /// Only a missing blob store is an error. Every other outcome, including
    /// "nothing stored", is reported through [`StoreOutcome`].
    #[tracing::instrument(
        skip_all,
        fields(correlation_id = %Uuid::new_v4(), file_count = request.files.len())
    )]
    pub async fn store(&self, request: StoreRequest) -> Result<StoreOutcome, AppError> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            tracing::error!(
                stage = "configuration",
                outcome = "missing_storage",
                "Blob storage is not configured"
            );
            AppError::Configuration(
                "File storage is not configured: blob store credentials are missing".to_string(),
            )
        })?;

        let hint = request
            .client_name
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(String::from);

        if request.files.is_empty() {
            tracing::info!(stage = "validate", outcome = "empty", "No files submitted");
            return Ok(StoreOutcome::empty("No files to store", hint));
        }

        let submitted = request.files.len();
        let valid: Vec<ValidFile> = request.files.into_iter().filter_map(prepare).collect();
        let skipped = submitted - valid.len();

        if valid.is_empty() {
            tracing::warn!(
                stage = "validate",
                outcome = "all_invalid",
                skipped,
                "Every submitted file was invalid"
            );
            let mut outcome = StoreOutcome::empty(
                format!(
                    "No valid files to store: all {} file(s) were empty, missing data, or placeholders",
                    submitted
                ),
                hint,
            );
            outcome.skipped = skipped;
            return Ok(outcome);
        }

        let resolution = self.resolver.resolve(hint.as_deref()).await;
        let client_name = resolution.client_name().to_string();
        let status = resolution.status();

        let mut stored: Vec<StoredFile> = Vec::with_capacity(valid.len());
        let mut failed = 0usize;

        for file in valid {
            match self
                .promote(storage.as_ref(), file, &client_name, status, request.uploaded_by)
                .await
            {
                Some(row) => stored.push(row.into()),
                None => failed += 1,
            }
        }

        let attempted = stored.len() + failed;
        let outcome = if stored.is_empty() {
            tracing::error!(
                stage = "store",
                outcome = "total_failure",
                attempted,
                skipped,
                "No file in the batch could be stored"
            );
            StoreOutcome {
                success: false,
                message: format!("Failed to store any of the {} file(s)", attempted),
                stored_files: stored,
                client_name: Some(client_name),
                skipped,
                failed,
            }
        } else {
            let result = if failed == 0 { "success" } else { "partial" };
            tracing::info!(
                stage = "store",
                outcome = result,
                stored = stored.len(),
                failed,
                skipped,
                client_name = %client_name,
                resolution = resolution.outcome(),
                "Promotion batch finished"
            );
            StoreOutcome {
                success: true,
                message: success_message(stored.len(), failed, skipped, &resolution),
                stored_files: stored,
                client_name: Some(client_name),
                skipped,
                failed,
            }
        };

        Ok(outcome)
    }

    /// Upload one file and record it. `None` means the item was dropped.
    async fn promote(
        &self,
        storage: &dyn Storage,
        file: ValidFile,
        client_name: &str,
        status: FileStatus,
        uploaded_by: Option<Uuid>,
    ) -> Option<DurableFile> {
        let id = durable_id(file.temp_id.as_deref());
        let key = upload_key(&file.filename);
        let size = file.bytes.len() as i64;

        let file_url = match storage
            .upload_with_key(&key, file.bytes, &file.content_type)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(
                    stage = "upload",
                    outcome = "failed",
                    filename = %file.filename,
                    key = %key,
                    error = %e,
                    "Blob upload failed, dropping file"
                );
                return None;
            }
        };

        let record = NewDurableFile {
            id,
            client_name: client_name.to_string(),
            status,
            file_name: file.filename.clone(),
            file_type: file.content_type,
            file_size: size,
            file_url,
            storage_key: key,
            uploaded_by,
        };

        match self.records.insert(&record).await {
            Ok(row) => {
                tracing::debug!(
                    stage = "record",
                    outcome = "stored",
                    filename = %row.file_name,
                    file_id = %row.id,
                    status = %row.status,
                    "File promoted"
                );
                Some(row)
            }
            Err(e) => {
                tracing::error!(
                    stage = "record",
                    outcome = "failed",
                    filename = %file.filename,
                    file_id = %id,
                    error = %e,
                    "Metadata insert failed, dropping file"
                );
                None
            }
        }
    }
}

/// Reuse the staging id when it is a canonical UUID, otherwise mint one.
pub fn durable_id(temp_id: Option<&str>) -> Uuid {
    temp_id
        .map(str::trim)
        .filter(|id| id.len() == CANONICAL_UUID_LEN)
        .and_then(|id| Uuid::parse_str(id).ok())
        .filter(|id| !id.is_nil())
        .unwrap_or_else(Uuid::new_v4)
}

/// Pre-flight checks. Invalid payloads are skipped, never fatal.
fn prepare(payload: FilePayload) -> Option<ValidFile> {
    let skip = |reason: &'static str| {
        tracing::warn!(
            stage = "validate",
            outcome = "skipped",
            filename = %payload.filename,
            reason,
            "Skipping invalid file payload"
        );
    };

    if is_test_fixture(&payload.filename) {
        skip("placeholder");
        return None;
    }
    if payload.size == 0 {
        skip("zero_size");
        return None;
    }
    let buffer = match payload.file_buffer.as_deref().map(str::trim) {
        Some(b) if !b.is_empty() => b,
        _ => {
            skip("missing_buffer");
            return None;
        }
    };
    let bytes = match STANDARD.decode(strip_data_url(buffer)) {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => {
            skip("empty_buffer");
            return None;
        }
        Err(_) => {
            skip("invalid_base64");
            return None;
        }
    };

    let content_type = if payload.content_type.trim().is_empty() {
        FALLBACK_CONTENT_TYPE.to_string()
    } else {
        payload.content_type.trim().to_string()
    };
    let filename = if is_usable_filename(&payload.filename) {
        payload.filename.trim().to_string()
    } else {
        synthesize_filename(&content_type, Utc::now().timestamp_millis())
    };

    Some(ValidFile {
        temp_id: payload.temp_id,
        filename,
        content_type,
        bytes,
    })
}

/// Accept `data:<mime>;base64,<payload>` as well as bare base64.
fn strip_data_url(buffer: &str) -> &str {
    match buffer.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => buffer,
    }
}

fn success_message(stored: usize, failed: usize, skipped: usize, resolution: &Resolution) -> String {
    let mut message = format!("Successfully stored {} file(s)", stored);
    match resolution {
        Resolution::Matched(m) => message.push_str(&format!(" for client {}", m.name)),
        Resolution::Degraded { hint, .. } => message.push_str(&format!(" for client {}", hint)),
        Resolution::Unmatched { hint } => message.push_str(&format!(
            " in the unassigned queue: no registered client matches \"{}\"",
            hint
        )),
        Resolution::NoHint => message.push_str(" in the unassigned queue"),
    }
    if failed > 0 {
        message.push_str(&format!("; {} file(s) failed to store", failed));
    }
    if skipped > 0 {
        message.push_str(&format!("; {} invalid file(s) skipped", skipped));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use casedesk_core::ErrorMetadata;

    struct Harness {
        storage: MockStorage,
        records: MockFileRecordStore,
        writer: FileStoreWriter,
    }

    fn harness(clients: &[&str]) -> Harness {
        let storage = MockStorage::new();
        let records = MockFileRecordStore::new();
        let resolver =
            ClientResolver::with_default_threshold(Arc::new(MockClientDirectory::with_clients(clients)));
        let writer = FileStoreWriter::new(
            Some(Arc::new(storage.clone())),
            Arc::new(records.clone()),
            resolver,
        );
        Harness {
            storage,
            records,
            writer,
        }
    }

    fn request(files: Vec<FilePayload>, client_name: Option<&str>) -> StoreRequest {
        StoreRequest {
            files,
            client_name: client_name.map(String::from),
            uploaded_by: None,
        }
    }

    #[test]
    fn test_durable_id_reuses_canonical_uuid() {
        let temp_id = Uuid::new_v4();
        assert_eq!(durable_id(Some(&temp_id.to_string())), temp_id);
        assert_eq!(durable_id(Some(&temp_id.hyphenated().to_string().to_uppercase())), temp_id);
    }

    #[test]
    fn test_durable_id_mints_for_non_canonical_ids() {
        for input in [
            None,
            Some(""),
            Some("temp_1700000000000"),
            Some("123"),
            Some("00000000-0000-0000-0000-000000000000"),
            Some("67e5504410b1426f9247bb680e5fe0c8"),
        ] {
            let id = durable_id(input);
            assert!(!id.is_nil());
            assert_ne!(Some(id.to_string().as_str()), input);
        }
        assert_ne!(durable_id(Some("abc")), durable_id(Some("abc")));
    }

    #[tokio::test]
    async fn test_promoted_file_keeps_staging_id() {
        let h = harness(&["sally"]);
        let file = payload("brief.pdf", "application/pdf", 10);
        let temp_id = file.temp_id.clone().unwrap();

        let outcome = h.writer.store(request(vec![file], Some("sally"))).await.unwrap();
        assert_eq!(outcome.stored_files[0].id.to_string(), temp_id);
    }

    #[tokio::test]
    async fn test_partial_failure_containment() {
        let h = harness(&[]);
        let files = vec![
            payload("one.pdf", "application/pdf", 10),
            payload_without_buffer("two.pdf", "application/pdf", 10),
            payload("three.pdf", "application/pdf", 10),
        ];

        let outcome = h.writer.store(request(files, None)).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.stored_files.len(), 2);
        assert_eq!(outcome.skipped, 1);
        let names: Vec<_> = outcome.stored_files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["one.pdf", "three.pdf"]);
    }

    #[tokio::test]
    async fn test_all_invalid_differs_from_empty_batch() {
        let h = harness(&[]);
        let invalid = vec![
            payload("a.pdf", "application/pdf", 0),
            payload("b.pdf", "application/pdf", 0),
        ];

        let outcome = h.writer.store(request(invalid, None)).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("No valid files"));
        assert_eq!(outcome.skipped, 2);

        let empty = h.writer.store(request(vec![], None)).await.unwrap();
        assert!(!empty.success);
        assert!(empty.message.contains("No files to store"));
        assert_ne!(outcome.message, empty.message);
        assert_eq!(h.storage.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_placeholder_and_bad_base64_are_skipped() {
        let h = harness(&[]);
        let mut garbled = payload("real.pdf", "application/pdf", 10);
        garbled.file_buffer = Some("!!not base64!!".to_string());
        let files = vec![payload("test.pdf", "application/pdf", 10), garbled];

        let outcome = h.writer.store(request(files, None)).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("No valid files"));
    }

    #[tokio::test]
    async fn test_total_failure_reports_count() {
        let h = harness(&[]);
        h.storage.fail_uploads_to("uploads/a.pdf");
        h.records.fail_inserts_for("b.pdf");
        let files = vec![
            payload("a.pdf", "application/pdf", 10),
            payload("b.pdf", "application/pdf", 10),
        ];

        let outcome = h.writer.store(request(files, None)).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Failed to store any of the 2 file(s)");
        assert_eq!(outcome.failed, 2);
        assert!(outcome.stored_files.is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_drops_only_that_item() {
        let h = harness(&["sally"]);
        h.storage.fail_uploads_to("uploads/broken.pdf");
        let files = vec![
            payload("broken.pdf", "application/pdf", 10),
            payload("ok.pdf", "application/pdf", 10),
        ];

        let outcome = h.writer.store(request(files, Some("sally"))).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.message.starts_with("Successfully stored 1 file(s)"));
        assert_eq!(h.records.files().len(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_hint_goes_to_temp_queue() {
        let h = harness(&["sally"]);
        let outcome = h
            .writer
            .store(request(
                vec![payload("document.docx", DOCX_CONTENT_TYPE, 1_024_000)],
                Some("zzz-no-such-client"),
            ))
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.client_name.as_deref(), Some("zzz-no-such-client"));
        let stored = &outcome.stored_files[0];
        assert_eq!(stored.status, FileStatus::TempQueue);
        assert_eq!(stored.client_name, "zzz-no-such-client");
    }

    #[tokio::test]
    async fn test_matched_hint_is_assigned_with_canonical_name() {
        let h = harness(&["Sally"]);
        let outcome = h
            .writer
            .store(request(
                vec![payload("document.docx", DOCX_CONTENT_TYPE, 1_024_000)],
                Some("sally"),
            ))
            .await
            .unwrap();

        let stored = &outcome.stored_files[0];
        assert_eq!(stored.status, FileStatus::Assigned);
        assert_eq!(stored.client_name, "Sally");
        assert_eq!(stored.size, 1_024_000);
        assert_eq!(stored.url, "https://blobs.test/storage/v1/object/public/uploads/document.docx");
        assert_eq!(h.storage.object("uploads/document.docx").unwrap().len(), 1_024_000);
    }

    #[tokio::test]
    async fn test_no_hint_records_unassigned() {
        let h = harness(&["sally"]);
        let outcome = h
            .writer
            .store(request(vec![payload("memo.pdf", "application/pdf", 5)], None))
            .await
            .unwrap();

        assert_eq!(outcome.stored_files[0].client_name, "Unassigned");
        assert_eq!(outcome.stored_files[0].status, FileStatus::TempQueue);
    }

    #[tokio::test]
    async fn test_same_filename_overwrites_blob_but_adds_row() {
        let h = harness(&[]);
        h.writer
            .store(request(vec![payload("scan.png", "image/png", 10)], None))
            .await
            .unwrap();
        h.writer
            .store(request(vec![payload("scan.png", "image/png", 20)], None))
            .await
            .unwrap();

        assert_eq!(h.storage.object_count(), 1);
        assert_eq!(h.storage.object("uploads/scan.png").unwrap().len(), 20);
        assert_eq!(h.records.files().len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_promotion_of_same_temp_id_is_rejected_by_key() {
        let h = harness(&[]);
        let file = payload("retainer.pdf", "application/pdf", 10);

        let first = h.writer.store(request(vec![file.clone()], None)).await.unwrap();
        let second = h.writer.store(request(vec![file], None)).await.unwrap();

        assert!(first.success);
        assert!(!second.success);
        assert_eq!(h.records.files().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_storage_is_configuration_error() {
        let writer = FileStoreWriter::new(
            None,
            Arc::new(MockFileRecordStore::new()),
            ClientResolver::with_default_threshold(Arc::new(MockClientDirectory::new())),
        );

        let err = writer
            .store(request(vec![payload("a.pdf", "application/pdf", 1)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_data_url_prefix_is_accepted() {
        assert_eq!(strip_data_url("data:application/pdf;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("QUJD"), "QUJD");
    }
}
