//! Mock repository implementations for testing

use async_trait::async_trait;
use casedesk_core::models::{ClientCandidate, DurableFile, NewDurableFile};
use casedesk_core::AppError;
use casedesk_db::{ClientDirectory, FileRecordStore};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory client registry.
///
/// Exact lookups compare names case-insensitively. Similarity scores for the
/// fuzzy path are configured per `(hint, name)` pair with `set_similarity`.
#[derive(Clone, Default)]
pub struct MockClientDirectory {
    clients: Arc<Mutex<Vec<String>>>,
    similarities: Arc<Mutex<HashMap<(String, String), f32>>>,
    failing: bool,
    lookups: Arc<AtomicUsize>,
}

impl MockClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clients(names: &[&str]) -> Self {
        let directory = Self::new();
        for name in names {
            directory.add_client(name);
        }
        directory
    }

    /// A registry whose every lookup fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn add_client(&self, name: &str) {
        self.clients.lock().unwrap().push(name.to_string());
    }

    pub fn set_similarity(&self, hint: &str, name: &str, similarity: f32) {
        self.similarities
            .lock()
            .unwrap()
            .insert((hint.to_lowercase(), name.to_string()), similarity);
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::Internal(
                "function search_clients_precise(text, real) does not exist".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ClientDirectory for MockClientDirectory {
    async fn find_exact(&self, name: &str) -> Result<Vec<ClientCandidate>, AppError> {
        self.check_available()?;
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.eq_ignore_ascii_case(name.trim()))
            .map(|c| ClientCandidate {
                name: c.clone(),
                similarity: 1.0,
            })
            .collect())
    }

    async fn search_precise(
        &self,
        name: &str,
        threshold: f32,
    ) -> Result<Vec<ClientCandidate>, AppError> {
        self.check_available()?;
        let hint = name.trim().to_lowercase();
        let similarities = self.similarities.lock().unwrap();
        let mut rows: Vec<ClientCandidate> = self
            .clients
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| {
                let similarity = *similarities.get(&(hint.clone(), c.clone()))?;
                (similarity > threshold).then(|| ClientCandidate {
                    name: c.clone(),
                    similarity,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        Ok(rows)
    }
}

/// In-memory file metadata store.
///
/// Inserts for filenames registered with `fail_inserts_for` fail, as does
/// an insert whose id already exists (mirroring the primary key).
#[derive(Clone, Default)]
pub struct MockFileRecordStore {
    rows: Arc<Mutex<Vec<DurableFile>>>,
    failing_names: Arc<Mutex<HashSet<String>>>,
    failing_list: bool,
}

impl MockFileRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose listing query always fails.
    pub fn failing_list() -> Self {
        Self {
            failing_list: true,
            ..Self::default()
        }
    }

    pub fn fail_inserts_for(&self, file_name: &str) {
        self.failing_names
            .lock()
            .unwrap()
            .insert(file_name.to_string());
    }

    pub fn add_file(&self, file: DurableFile) {
        self.rows.lock().unwrap().push(file);
    }

    pub fn files(&self) -> Vec<DurableFile> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileRecordStore for MockFileRecordStore {
    async fn insert(&self, file: &NewDurableFile) -> Result<DurableFile, AppError> {
        if self.failing_names.lock().unwrap().contains(&file.file_name) {
            return Err(AppError::Internal(format!(
                "insert rejected for {}",
                file.file_name
            )));
        }

        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.id == file.id) {
            return Err(AppError::Internal(format!(
                "duplicate key value violates unique constraint \"client_files_pkey\" ({})",
                file.id
            )));
        }

        let row = DurableFile {
            id: file.id,
            client_name: file.client_name.clone(),
            status: file.status,
            file_name: file.file_name.clone(),
            file_type: file.file_type.clone(),
            file_size: file.file_size,
            file_url: file.file_url.clone(),
            storage_key: file.storage_key.clone(),
            uploaded_by: file.uploaded_by,
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list_for_client(
        &self,
        client_name: &str,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<DurableFile>, AppError> {
        if self.failing_list {
            return Err(AppError::Internal("connection refused".to_string()));
        }

        let mut rows: Vec<DurableFile> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.client_name.eq_ignore_ascii_case(client_name.trim()))
            .filter(|r| since.map_or(true, |s| r.created_at >= s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}
