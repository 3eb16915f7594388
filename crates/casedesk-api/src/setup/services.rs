//! Service and provider wiring

use crate::state::{AppState, Providers};
use anyhow::Result;
use casedesk_core::Config;
use casedesk_db::{ClientFileRepository, ClientRepository};
use casedesk_services::{AnthropicClient, LanguageModel, Storage};
use sqlx::PgPool;
use std::sync::Arc;

pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Option<Arc<dyn Storage>>,
) -> Result<Arc<AppState>> {
    let model: Option<Arc<dyn LanguageModel>> = match config.anthropic_api_key() {
        Some(key) => {
            let client =
                AnthropicClient::new(key.to_string(), config.anthropic_model().to_string())?;
            tracing::info!(model = %config.anthropic_model(), "Chat model configured");
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("ANTHROPIC_API_KEY not set: chat endpoint is disabled");
            None
        }
    };

    let providers = Providers {
        records: Arc::new(ClientFileRepository::new(pool.clone())),
        clients: Arc::new(ClientRepository::new(pool.clone())),
        storage,
        model,
        pool: Some(pool),
    };

    Ok(Arc::new(AppState::new(config.clone(), providers)))
}
