//! AI context bridge
//!
//! Works out the real file state for a conversation before the assistant
//! answers and renders it as a deterministic message the assistant must treat
//! as ground truth. Decision order:
//!
//! 1. client known and nothing supplied: recent durable files for the client
//! 2. caller-supplied `existing_files`: described without a database call
//! 3. staged files (request payloads, else the conversation cache): promoted
//! 4. nothing anywhere: a negative result, never an error

use casedesk_core::models::{
    ContextSource, DurableFile, FileCategory, FileContextReport, FilePayload, StagedFile,
    StoredFile,
};
use casedesk_core::AppError;
use casedesk_db::FileRecordStore;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::staging_cache::{ConversationKey, StagingCache};
use crate::writer::{FileStoreWriter, StoreRequest};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ContextRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    /// Files the caller already knows are stored.
    #[serde(default)]
    pub existing_files: Vec<StoredFile>,
    /// Staged payloads to promote when nothing is stored yet.
    #[serde(default)]
    pub files: Vec<FilePayload>,
    /// Restricts cached staged files to these ids.
    #[serde(default)]
    pub temp_ids: Option<Vec<String>>,
    #[serde(skip)]
    pub uploaded_by: Option<Uuid>,
}

#[derive(Clone)]
pub struct ContextBridge {
    records: Arc<dyn FileRecordStore>,
    writer: FileStoreWriter,
    cache: Arc<StagingCache>,
    recent_window: Duration,
    recent_limit: i64,
}

impl ContextBridge {
    pub fn new(
        records: Arc<dyn FileRecordStore>,
        writer: FileStoreWriter,
        cache: Arc<StagingCache>,
        recent_window_hours: i64,
        recent_limit: i64,
    ) -> Self {
        Self {
            records,
            writer,
            cache,
            recent_window: Duration::hours(recent_window_hours),
            recent_limit,
        }
    }

    /// Resolve the file state for a turn, promoting staged files if needed.
    ///
    /// Only a missing blob store surfaces as an error.
    pub async fn report(&self, request: ContextRequest) -> Result<FileContextReport, AppError> {
        let client = non_blank(request.client_name.as_deref());
        let conversation = non_blank(request.conversation_id.as_deref())
            .map(|id| ConversationKey::new(request.uploaded_by, id));

        if let Some(client) = client.as_deref() {
            if request.existing_files.is_empty() && request.files.is_empty() {
                if let Some(recent) = self.recent_files(client).await {
                    if !recent.is_empty() {
                        let files: Vec<StoredFile> =
                            recent.into_iter().map(StoredFile::from).collect();
                        return Ok(self.stored_report(
                            ContextSource::DurableStore,
                            files,
                            Some(client.to_string()),
                        ));
                    }
                }
            }
        }

        if !request.existing_files.is_empty() {
            return Ok(self.stored_report(
                ContextSource::ExistingFiles,
                request.existing_files,
                client,
            ));
        }

        let staged = if !request.files.is_empty() {
            request.files
        } else if let Some(conversation) = conversation.as_ref() {
            let cached = self.cache.files(conversation).await;
            filter_temp_ids(cached, request.temp_ids.as_deref())
                .into_iter()
                .map(FilePayload::from)
                .collect()
        } else {
            Vec::new()
        };

        if !staged.is_empty() {
            let outcome = self
                .writer
                .store(StoreRequest {
                    files: staged,
                    client_name: client.clone(),
                    uploaded_by: request.uploaded_by,
                })
                .await?;

            if let Some(conversation) = conversation.as_ref() {
                let promoted: Vec<String> =
                    outcome.stored_files.iter().map(|f| f.id.to_string()).collect();
                if !promoted.is_empty() {
                    self.cache.remove(conversation, &promoted).await;
                }
            }

            let message = if outcome.success {
                format!(
                    "{}.\n{}",
                    outcome.message,
                    listing(outcome.stored_files.iter().map(|f| (&f.name, &f.content_type)))
                )
            } else {
                outcome.message.clone()
            };

            return Ok(FileContextReport {
                success: outcome.success,
                source: ContextSource::Promoted,
                message,
                files: outcome.stored_files,
                client_name: outcome.client_name.or(client),
            });
        }

        let message = match conversation {
            Some(key) => format!(
                "No temp files found for this chat (conversation {})",
                key.conversation_id()
            ),
            None => "No files to store".to_string(),
        };
        tracing::info!(stage = "context", outcome = "none", "No files found for turn");

        Ok(FileContextReport {
            success: false,
            source: ContextSource::None,
            message,
            files: Vec::new(),
            client_name: client,
        })
    }

    /// Read-only view for the system prompt: durable files for the client and
    /// staged files `owner` still has waiting in the cache. Nothing is
    /// promoted.
    pub async fn snapshot(
        &self,
        owner: Option<Uuid>,
        conversation_id: Option<&str>,
        client_name: Option<&str>,
    ) -> FileContextReport {
        let client = non_blank(client_name);

        let stored: Vec<StoredFile> = match client.as_deref() {
            Some(client) => self
                .recent_files(client)
                .await
                .unwrap_or_default()
                .into_iter()
                .map(StoredFile::from)
                .collect(),
            None => Vec::new(),
        };

        let staged = match non_blank(conversation_id) {
            Some(id) => self.cache.files(&ConversationKey::new(owner, id)).await,
            None => Vec::new(),
        };

        let mut sections = Vec::new();
        if !stored.is_empty() {
            sections.push(stored_message(&stored, client.as_deref()));
        }
        if !staged.is_empty() {
            sections.push(staged_message(&staged));
        }

        let source = match (stored.is_empty(), staged.is_empty()) {
            (false, _) => ContextSource::DurableStore,
            (true, false) => ContextSource::Staged,
            (true, true) => ContextSource::None,
        };
        let message = if sections.is_empty() {
            "There are no stored or staged files for this conversation.".to_string()
        } else {
            sections.join("\n\n")
        };

        FileContextReport {
            success: source != ContextSource::None,
            source,
            message,
            files: stored,
            client_name: client,
        }
    }

    /// Recent durable files for a client. Lookup errors are logged and
    /// reported as `None` so the caller can fall through to the next source.
    async fn recent_files(&self, client: &str) -> Option<Vec<DurableFile>> {
        let since = Utc::now() - self.recent_window;
        match self
            .records
            .list_for_client(client, Some(since), self.recent_limit)
            .await
        {
            Ok(files) => Some(files),
            Err(e) => {
                tracing::warn!(
                    stage = "context",
                    outcome = "lookup_failed",
                    client_name = %client,
                    error = %e,
                    "Recent file lookup failed, falling back"
                );
                None
            }
        }
    }

    fn stored_report(
        &self,
        source: ContextSource,
        files: Vec<StoredFile>,
        client: Option<String>,
    ) -> FileContextReport {
        tracing::info!(
            stage = "context",
            outcome = "already_stored",
            file_count = files.len(),
            "Reporting stored files"
        );
        FileContextReport {
            success: true,
            source,
            message: stored_message(&files, client.as_deref()),
            files,
            client_name: client,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

pub(crate) fn filter_temp_ids(files: Vec<StagedFile>, temp_ids: Option<&[String]>) -> Vec<StagedFile> {
    match temp_ids {
        Some(ids) if !ids.is_empty() => files
            .into_iter()
            .filter(|f| ids.contains(&f.temp_id))
            .collect(),
        _ => files,
    }
}

pub(crate) fn stored_message(files: &[StoredFile], client: Option<&str>) -> String {
    let owner = match client {
        Some(client) => format!(" for client {}", client),
        None => String::new(),
    };
    format!(
        "{} file(s) are already stored{}:\n{}",
        files.len(),
        owner,
        listing(files.iter().map(|f| (&f.name, &f.content_type)))
    )
}

/// Staged entries carry their temp id so `store_files` can be narrowed with
/// `temp_ids`.
fn staged_message(files: &[StagedFile]) -> String {
    let entries = files
        .iter()
        .map(|f| {
            format!(
                "- {} ({}) [temp_id: {}]",
                f.filename,
                FileCategory::from_mime(&f.content_type).label(),
                f.temp_id
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{} uploaded file(s) are waiting to be stored:\n{}",
        files.len(),
        entries
    )
}

/// `- name (category)` per file.
fn listing<'a>(files: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    files
        .map(|(name, content_type)| {
            format!("- {} ({})", name, FileCategory::from_mime(content_type).label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
