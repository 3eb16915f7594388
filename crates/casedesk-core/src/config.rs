//! Configuration module
//!
//! Process configuration read once from the environment at startup: HTTP
//! server, database, session verification, blob storage, client matching,
//! staging cache and the assistant provider.

use std::env;

use crate::constants::{
    DEFAULT_CLIENT_MATCH_THRESHOLD, MAX_UPLOAD_SIZE_BYTES, STAGING_CACHE_CAPACITY,
    STAGING_CACHE_MAX_BYTES, STAGING_MAX_FILES_PER_CONVERSATION,
};
use crate::validation::base64_encoded_len;
use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const RECENT_FILES_WINDOW_HOURS: i64 = 24;
const RECENT_FILES_LIMIT: i64 = 20;
const CHAT_MAX_TOOL_ROUNDS: usize = 3;
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Server, database and session settings.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
    pub log_format: String,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Blob storage; `None` leaves the writer unconfigured
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Staging and promotion
    pub max_upload_size_bytes: usize,
    pub client_match_threshold: f32,
    pub recent_files_window_hours: i64,
    pub recent_files_limit: i64,
    pub staging_cache_capacity: usize,
    pub staging_max_files_per_conversation: usize,
    /// Budget for base64 payloads held across all cached conversations.
    pub staging_cache_max_bytes: usize,
    // Assistant provider
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub chat_max_tool_rounds: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AssistantConfig>);

impl Config {
    fn inner(&self) -> &AssistantConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        AssistantConfig::from_env().map(|c| Config(Box::new(c)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn client_match_threshold(&self) -> f32 {
        self.inner().client_match_threshold
    }

    pub fn recent_files_window_hours(&self) -> i64 {
        self.inner().recent_files_window_hours
    }

    pub fn recent_files_limit(&self) -> i64 {
        self.inner().recent_files_limit
    }

    pub fn staging_cache_capacity(&self) -> usize {
        self.inner().staging_cache_capacity
    }

    pub fn staging_max_files_per_conversation(&self) -> usize {
        self.inner().staging_max_files_per_conversation
    }

    pub fn staging_cache_max_bytes(&self) -> usize {
        self.inner().staging_cache_max_bytes
    }

    pub fn anthropic_api_key(&self) -> Option<&str> {
        self.inner().anthropic_api_key.as_deref()
    }

    pub fn anthropic_model(&self) -> &str {
        &self.inner().anthropic_model
    }

    pub fn chat_max_tool_rounds(&self) -> usize {
        self.inner().chat_max_tool_rounds
    }
}

impl AssistantConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase(),
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) if !value.trim().is_empty() => Some(
                value
                    .parse::<StorageBackend>()
                    .map_err(|e| anyhow::anyhow!("STORAGE_BACKEND: {}", e))?,
            ),
            _ => None,
        };

        let config = AssistantConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok().filter(|s| !s.is_empty()),
            s3_region: env::var("S3_REGION").ok().filter(|s| !s.is_empty()),
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            aws_region: env::var("AWS_REGION").ok().filter(|s| !s.is_empty()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok().filter(|s| !s.is_empty()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            max_upload_size_bytes: env::var("MAX_UPLOAD_SIZE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_UPLOAD_SIZE_BYTES),
            client_match_threshold: env::var("CLIENT_MATCH_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CLIENT_MATCH_THRESHOLD),
            recent_files_window_hours: env::var("RECENT_FILES_WINDOW_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(RECENT_FILES_WINDOW_HOURS),
            recent_files_limit: env::var("RECENT_FILES_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(RECENT_FILES_LIMIT),
            staging_cache_capacity: env::var("STAGING_CACHE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(STAGING_CACHE_CAPACITY),
            staging_max_files_per_conversation: env::var("STAGING_MAX_FILES_PER_CONVERSATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(STAGING_MAX_FILES_PER_CONVERSATION),
            staging_cache_max_bytes: env::var("STAGING_CACHE_MAX_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(STAGING_CACHE_MAX_BYTES),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|s| !s.is_empty()),
            anthropic_model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_MODEL.to_string()),
            chat_max_tool_rounds: env::var("CHAT_MAX_TOOL_ROUNDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(CHAT_MAX_TOOL_ROUNDS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if !(0.0..=1.0).contains(&self.client_match_threshold) {
            return Err(anyhow::anyhow!(
                "CLIENT_MATCH_THRESHOLD must be between 0.0 and 1.0"
            ));
        }

        if self.staging_cache_capacity == 0 {
            return Err(anyhow::anyhow!(
                "STAGING_CACHE_CAPACITY must be greater than zero"
            ));
        }

        if self.staging_max_files_per_conversation == 0 {
            return Err(anyhow::anyhow!(
                "STAGING_MAX_FILES_PER_CONVERSATION must be greater than zero"
            ));
        }

        if self.staging_cache_max_bytes < base64_encoded_len(self.max_upload_size_bytes) {
            return Err(anyhow::anyhow!(
                "STAGING_CACHE_MAX_BYTES must hold at least one encoded upload of MAX_UPLOAD_SIZE_BYTES"
            ));
        }

        match self.storage_backend {
            Some(StorageBackend::S3) => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            Some(StorageBackend::Local) => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            // Promotion reports a configuration error per request
            None => {}
        }

        Ok(())
    }
}
