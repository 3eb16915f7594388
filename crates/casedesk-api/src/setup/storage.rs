//! Storage setup and initialization

use anyhow::{Context, Result};
use casedesk_core::Config;
use casedesk_storage::{create_storage, Storage};
use std::sync::Arc;

/// A configured-but-broken backend is fatal here. An unconfigured one is
/// not: promotion then reports a configuration error per request.
pub async fn setup_storage(config: &Config) -> Result<Option<Arc<dyn Storage>>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize blob storage")?;

    match storage.as_ref() {
        Some(storage) => tracing::info!(
            backend = %storage.backend_type(),
            "Blob storage initialized"
        ),
        None => tracing::warn!(
            "STORAGE_BACKEND not set: uploads can be staged but not stored"
        ),
    }

    Ok(storage)
}
