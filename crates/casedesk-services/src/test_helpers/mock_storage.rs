//! In-memory blob store with per-key failure injection.

use async_trait::async_trait;
use casedesk_storage::{Storage, StorageBackend, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const BASE_URL: &str = "https://blobs.test/storage/v1/object/public";

#[derive(Clone, Default)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failing_keys: Arc<Mutex<HashSet<String>>>,
    uploads: Arc<AtomicUsize>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads_to(&self, storage_key: &str) {
        self.failing_keys
            .lock()
            .unwrap()
            .insert(storage_key.to_string());
    }

    pub fn object(&self, storage_key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(storage_key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Upload attempts, including failed ones.
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.failing_keys.lock().unwrap().contains(storage_key) {
            return Err(StorageError::UploadFailed(format!(
                "simulated failure for {}",
                storage_key
            )));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        self.public_url(storage_key)
    }

    fn public_url(&self, storage_key: &str) -> StorageResult<String> {
        Ok(format!("{}/{}", BASE_URL, storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
