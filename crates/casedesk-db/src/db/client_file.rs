use casedesk_core::{
    models::{DurableFile, NewDurableFile},
    AppError,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};

const FILE_COLUMNS: &str = "id, client_name, status, file_name, file_type, file_size, file_url, storage_key, uploaded_by, created_at";

/// Repository for promoted file metadata.
///
/// Rows are insert-only: a re-promotion creates a new row rather than
/// updating an existing one.
#[derive(Clone)]
pub struct ClientFileRepository {
    pool: PgPool,
}

impl ClientFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(
        skip(self, file),
        fields(db.table = "client_files", db.operation = "insert", db.record_id = %file.id)
    )]
    pub async fn insert(&self, file: &NewDurableFile) -> Result<DurableFile, AppError> {
        let query = format!(
            r#"
            INSERT INTO client_files
                (id, client_name, status, file_name, file_type, file_size, file_url, storage_key, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            FILE_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, DurableFile>(&query)
            .bind(file.id)
            .bind(&file.client_name)
            .bind(file.status)
            .bind(&file.file_name)
            .bind(&file.file_type)
            .bind(file.file_size)
            .bind(&file.file_url)
            .bind(&file.storage_key)
            .bind(file.uploaded_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    /// Files recorded for a client (case-insensitive), newest first.
    ///
    /// `since` restricts the result to rows created at or after that instant.
    #[tracing::instrument(skip(self), fields(db.table = "client_files", db.operation = "select"))]
    pub async fn list_for_client(
        &self,
        client_name: &str,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<DurableFile>, AppError> {
        let query = format!(
            r#"
            SELECT {}
            FROM client_files
            WHERE lower(client_name) = lower($1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            FILE_COLUMNS
        );

        let rows = sqlx::query_as::<Postgres, DurableFile>(&query)
            .bind(client_name.trim())
            .bind(since)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
