use casedesk_core::{models::ClientCandidate, AppError};
use sqlx::{PgPool, Postgres};

/// Read access to the client registry.
#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registry names equal to `name` ignoring case, oldest first.
    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "select"))]
    pub async fn find_exact(&self, name: &str) -> Result<Vec<ClientCandidate>, AppError> {
        let rows = sqlx::query_as::<Postgres, ClientCandidate>(
            r#"
            SELECT name, 1.0::real AS similarity
            FROM clients
            WHERE lower(name) = lower($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(name.trim())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Trigram similarity search through the `search_clients_precise` function.
    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "search"))]
    pub async fn search_precise(
        &self,
        name: &str,
        threshold: f32,
    ) -> Result<Vec<ClientCandidate>, AppError> {
        let rows = sqlx::query_as::<Postgres, ClientCandidate>(
            "SELECT name, similarity FROM search_clients_precise($1, $2)",
        )
        .bind(name.trim())
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
