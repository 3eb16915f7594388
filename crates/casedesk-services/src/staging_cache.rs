//! Conversation-scoped cache of staged uploads.
//!
//! Holds [`StagedFile`]s between the upload call and promotion so callers that
//! do not echo payloads back can still have them promoted. Entries belong to
//! one session user and one conversation; another user naming the same
//! conversation id reaches a different entry.
//!
//! The cache is bounded by conversation count, files per conversation and the
//! total base64 payload held. The least recently touched conversation is
//! evicted first.

use casedesk_core::constants::{
    STAGING_CACHE_CAPACITY, STAGING_CACHE_MAX_BYTES, STAGING_MAX_FILES_PER_CONVERSATION,
};
use casedesk_core::models::StagedFile;
use casedesk_core::AppError;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A conversation as seen by one session user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    owner: Option<Uuid>,
    conversation_id: String,
}

impl ConversationKey {
    pub fn new(owner: Option<Uuid>, conversation_id: impl Into<String>) -> Self {
        Self {
            owner,
            conversation_id: conversation_id.into(),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StagingLimits {
    pub conversations: usize,
    pub files_per_conversation: usize,
    pub max_bytes: usize,
}

impl Default for StagingLimits {
    fn default() -> Self {
        Self {
            conversations: STAGING_CACHE_CAPACITY,
            files_per_conversation: STAGING_MAX_FILES_PER_CONVERSATION,
            max_bytes: STAGING_CACHE_MAX_BYTES,
        }
    }
}

struct Entries {
    lru: LruCache<ConversationKey, Vec<StagedFile>>,
    bytes: usize,
}

pub struct StagingCache {
    entries: Mutex<Entries>,
    files_per_conversation: usize,
    max_bytes: usize,
}

fn buffered_len(files: &[StagedFile]) -> usize {
    files.iter().map(|f| f.file_buffer.len()).sum()
}

impl StagingCache {
    pub fn new(limits: StagingLimits) -> Self {
        let capacity = NonZeroUsize::new(limits.conversations).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(Entries {
                lru: LruCache::new(capacity),
                bytes: 0,
            }),
            files_per_conversation: limits.files_per_conversation.max(1),
            max_bytes: limits.max_bytes,
        }
    }

    /// Add a staged file to a conversation. A file with the same `temp_id`
    /// replaces the earlier entry.
    ///
    /// Rejected when the conversation already holds the maximum number of
    /// files or its payloads alone would exceed the byte budget. Other
    /// conversations are evicted to stay within the budget.
    pub async fn push(&self, key: &ConversationKey, file: StagedFile) -> Result<(), AppError> {
        let incoming = file.file_buffer.len();
        let mut guard = self.entries.lock().await;
        let entries = &mut *guard;

        let (held, replaced, count) = match entries.lru.peek(key) {
            Some(files) => (
                buffered_len(files),
                files
                    .iter()
                    .find(|f| f.temp_id == file.temp_id)
                    .map(|f| f.file_buffer.len()),
                files.len(),
            ),
            None => (0, None, 0),
        };

        if replaced.is_none() && count >= self.files_per_conversation {
            return Err(AppError::InvalidInput(format!(
                "Conversation {} already has {} staged files; store or clear them first",
                key.conversation_id, self.files_per_conversation
            )));
        }
        let replaced = replaced.unwrap_or(0);
        if held - replaced + incoming > self.max_bytes {
            return Err(AppError::InvalidInput(format!(
                "Staged files for conversation {} exceed the {} byte staging limit; store or clear them first",
                key.conversation_id, self.max_bytes
            )));
        }

        match entries.lru.get_mut(key) {
            Some(files) => {
                files.retain(|f| f.temp_id != file.temp_id);
                files.push(file);
            }
            None => {
                if let Some((evicted, files)) = entries.lru.push(key.clone(), vec![file]) {
                    entries.bytes = entries.bytes.saturating_sub(buffered_len(&files));
                    tracing::debug!(
                        conversation_id = %evicted.conversation_id,
                        dropped = files.len(),
                        reason = "capacity",
                        "Staging cache evicted conversation"
                    );
                }
            }
        }
        entries.bytes = entries.bytes - replaced + incoming;

        // The pushed conversation is most recent and fits alone, so eviction
        // stops before reaching it.
        while entries.bytes > self.max_bytes {
            let Some((evicted, files)) = entries.lru.pop_lru() else {
                break;
            };
            entries.bytes = entries.bytes.saturating_sub(buffered_len(&files));
            tracing::debug!(
                conversation_id = %evicted.conversation_id,
                dropped = files.len(),
                reason = "bytes",
                "Staging cache evicted conversation"
            );
        }

        Ok(())
    }

    /// Staged files for a conversation in upload order.
    pub async fn files(&self, key: &ConversationKey) -> Vec<StagedFile> {
        let mut entries = self.entries.lock().await;
        entries.lru.get(key).cloned().unwrap_or_default()
    }

    /// Drop the given temp ids after promotion. Returns how many were removed.
    pub async fn remove(&self, key: &ConversationKey, temp_ids: &[String]) -> usize {
        let mut guard = self.entries.lock().await;
        let entries = &mut *guard;
        let Some(files) = entries.lru.get_mut(key) else {
            return 0;
        };

        let before = files.len();
        let before_bytes = buffered_len(files);
        files.retain(|f| !temp_ids.contains(&f.temp_id));
        let removed = before - files.len();
        let freed = before_bytes - buffered_len(files);

        if files.is_empty() {
            entries.lru.pop(key);
        }
        entries.bytes = entries.bytes.saturating_sub(freed);
        removed
    }

    /// Forget a conversation entirely. Returns how many files were dropped.
    pub async fn clear(&self, key: &ConversationKey) -> usize {
        let mut guard = self.entries.lock().await;
        let entries = &mut *guard;
        match entries.lru.pop(key) {
            Some(files) => {
                entries.bytes = entries.bytes.saturating_sub(buffered_len(&files));
                files.len()
            }
            None => 0,
        }
    }

    /// Base64 payload bytes currently held.
    pub async fn buffered_bytes(&self) -> usize {
        self.entries.lock().await.bytes
    }
}
