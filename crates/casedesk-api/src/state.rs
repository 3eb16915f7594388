//! Application state shared by all handlers.

use casedesk_core::{Config, UploadValidator};
use casedesk_db::{ClientDirectory, FileRecordStore};
use casedesk_services::{
    ChatOrchestrator, ClientResolver, ContextBridge, FileStoreWriter, LanguageModel,
    StagingCache, StagingLimits, StagingService, Storage,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Providers constructed once at startup and injected into the services.
#[derive(Clone)]
pub struct Providers {
    pub records: Arc<dyn FileRecordStore>,
    pub clients: Arc<dyn ClientDirectory>,
    pub storage: Option<Arc<dyn Storage>>,
    pub model: Option<Arc<dyn LanguageModel>>,
    /// Present in production; tests run without a database.
    pub pool: Option<PgPool>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub staging: StagingService,
    pub cache: Arc<StagingCache>,
    pub writer: FileStoreWriter,
    pub bridge: ContextBridge,
    pub orchestrator: ChatOrchestrator,
    pub records: Arc<dyn FileRecordStore>,
    pub storage: Option<Arc<dyn Storage>>,
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(config: Config, providers: Providers) -> Self {
        let staging = StagingService::new(UploadValidator::new(config.max_upload_size_bytes()));
        let cache = Arc::new(StagingCache::new(StagingLimits {
            conversations: config.staging_cache_capacity(),
            files_per_conversation: config.staging_max_files_per_conversation(),
            max_bytes: config.staging_cache_max_bytes(),
        }));
        let resolver = ClientResolver::new(providers.clients, config.client_match_threshold());
        let writer = FileStoreWriter::new(
            providers.storage.clone(),
            providers.records.clone(),
            resolver,
        );
        let bridge = ContextBridge::new(
            providers.records.clone(),
            writer.clone(),
            cache.clone(),
            config.recent_files_window_hours(),
            config.recent_files_limit(),
        );
        let orchestrator = ChatOrchestrator::new(
            providers.model,
            bridge.clone(),
            providers.records.clone(),
            cache.clone(),
            config.chat_max_tool_rounds(),
        );

        Self {
            config,
            staging,
            cache,
            writer,
            bridge,
            orchestrator,
            records: providers.records,
            storage: providers.storage,
            pool: providers.pool,
        }
    }
}
