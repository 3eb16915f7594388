//! Repository trait abstractions
//!
//! Services depend on these traits instead of the concrete repositories so
//! tests can substitute in-memory implementations.

use async_trait::async_trait;
use casedesk_core::error::AppError;
use casedesk_core::models::{ClientCandidate, DurableFile, NewDurableFile};
use chrono::{DateTime, Utc};

use crate::db::{ClientFileRepository, ClientRepository};

/// Durable file metadata operations used by the writer and the bridge.
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    async fn insert(&self, file: &NewDurableFile) -> Result<DurableFile, AppError>;

    async fn list_for_client(
        &self,
        client_name: &str,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<DurableFile>, AppError>;
}

/// Client registry lookups used by the association resolver.
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn find_exact(&self, name: &str) -> Result<Vec<ClientCandidate>, AppError>;

    async fn search_precise(
        &self,
        name: &str,
        threshold: f32,
    ) -> Result<Vec<ClientCandidate>, AppError>;
}

#[async_trait]
impl FileRecordStore for ClientFileRepository {
    async fn insert(&self, file: &NewDurableFile) -> Result<DurableFile, AppError> {
        ClientFileRepository::insert(self, file).await
    }

    async fn list_for_client(
        &self,
        client_name: &str,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<DurableFile>, AppError> {
        ClientFileRepository::list_for_client(self, client_name, since, limit).await
    }
}

#[async_trait]
impl ClientDirectory for ClientRepository {
    async fn find_exact(&self, name: &str) -> Result<Vec<ClientCandidate>, AppError> {
        ClientRepository::find_exact(self, name).await
    }

    async fn search_precise(
        &self,
        name: &str,
        threshold: f32,
    ) -> Result<Vec<ClientCandidate>, AppError> {
        ClientRepository::search_precise(self, name, threshold).await
    }
}
