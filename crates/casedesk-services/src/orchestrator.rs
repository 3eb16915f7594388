//! Conversational orchestrator boundary
//!
//! Runs one chat turn: takes a read-only snapshot of the conversation's file
//! state, hands it to the model as ground truth, executes the tool calls the
//! model makes (bounded number of rounds) and returns the final reply with
//! the tool outcomes. No streaming.

use casedesk_core::models::{FileContextReport, FilePayload, StoredFile};
use casedesk_core::{AppError, ErrorMetadata};
use casedesk_db::FileRecordStore;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::bridge::{filter_temp_ids, stored_message, ContextBridge, ContextRequest};
use crate::llm::{ContentBlock, LanguageModel, Message, ModelRequest, Role, ToolDefinition};
use crate::staging_cache::{ConversationKey, StagingCache};
use crate::tools::{
    tool_definitions, ListClientFilesInput, StoreFilesInput, LIST_CLIENT_FILES, STORE_FILES,
};

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 3;
const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    pub messages: Vec<ChatTurn>,
    #[serde(skip)]
    pub uploaded_by: Option<Uuid>,
}

/// A tool call the model made and what it returned.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ToolExecution {
    pub name: String,
    #[schema(value_type = Object)]
    pub input: JsonValue,
    pub output: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatReply {
    pub reply: String,
    /// File state after the turn: the last `store_files` report, else the
    /// snapshot the model was given.
    pub file_context: FileContextReport,
    pub tool_calls: Vec<ToolExecution>,
    pub model: String,
}

#[derive(Clone)]
pub struct ChatOrchestrator {
    model: Option<Arc<dyn LanguageModel>>,
    bridge: ContextBridge,
    records: Arc<dyn FileRecordStore>,
    cache: Arc<StagingCache>,
    tools: Vec<ToolDefinition>,
    max_rounds: usize,
}

/// Per-turn values the tools need.
struct TurnScope<'a> {
    conversation_id: Option<&'a str>,
    client_name: Option<&'a str>,
    uploaded_by: Option<Uuid>,
}

impl ChatOrchestrator {
    pub fn new(
        model: Option<Arc<dyn LanguageModel>>,
        bridge: ContextBridge,
        records: Arc<dyn FileRecordStore>,
        cache: Arc<StagingCache>,
        max_rounds: usize,
    ) -> Self {
        Self {
            model,
            bridge,
            records,
            cache,
            tools: tool_definitions(),
            max_rounds,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    #[tracing::instrument(
        skip_all,
        fields(conversation_id = request.conversation_id.as_deref().unwrap_or("-"))
    )]
    pub async fn respond(&self, request: ChatRequest) -> Result<ChatReply, AppError> {
        let model = self.model.as_ref().ok_or_else(|| {
            AppError::Configuration(
                "Chat is not configured: the language model API key is missing".to_string(),
            )
        })?;

        match request.messages.last() {
            Some(turn) if turn.role == Role::User && !turn.content.trim().is_empty() => {}
            _ => {
                return Err(AppError::InvalidInput(
                    "The conversation must end with a non-empty user message".to_string(),
                ))
            }
        }

        let scope = TurnScope {
            conversation_id: request.conversation_id.as_deref(),
            client_name: request.client_name.as_deref(),
            uploaded_by: request.uploaded_by,
        };

        let snapshot = self
            .bridge
            .snapshot(scope.uploaded_by, scope.conversation_id, scope.client_name)
            .await;
        let system = system_prompt(&snapshot);

        let mut messages: Vec<Message> = request
            .messages
            .iter()
            .map(|turn| Message::text(turn.role, turn.content.clone()))
            .collect();
        let mut executions = Vec::new();
        let mut file_context = snapshot;
        let started = Instant::now();

        let mut round = 0;
        let reply = loop {
            let response = model
                .complete(ModelRequest {
                    system: system.clone(),
                    messages: messages.clone(),
                    tools: self.tools.clone(),
                })
                .await?;

            let tool_uses = response.tool_uses();
            if tool_uses.is_empty() {
                break response.text();
            }
            if round >= self.max_rounds {
                tracing::warn!(
                    stage = "chat",
                    outcome = "tool_round_limit",
                    rounds = round,
                    "Model kept calling tools, stopping"
                );
                let text = response.text();
                break if text.trim().is_empty() {
                    "I could not finish the requested file operations in this turn.".to_string()
                } else {
                    text
                };
            }

            messages.push(Message {
                role: Role::Assistant,
                content: response.content.clone(),
            });

            let mut results = Vec::with_capacity(tool_uses.len());
            for (id, name, input) in tool_uses {
                let (output, is_error, report) = self.execute_tool(&name, &input, &scope).await;
                if let Some(report) = report {
                    file_context = report;
                }
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id,
                    content: output.clone(),
                    is_error,
                });
                executions.push(ToolExecution {
                    name,
                    input,
                    output,
                    is_error,
                });
            }
            messages.push(Message {
                role: Role::User,
                content: results,
            });
            round += 1;
        };

        tracing::info!(
            stage = "chat",
            outcome = "replied",
            model = model.model_name(),
            tool_calls = executions.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Chat turn finished"
        );

        Ok(ChatReply {
            reply,
            file_context,
            tool_calls: executions,
            model: model.model_name().to_string(),
        })
    }

    /// Run one tool call. Tool failures are reported back to the model, not
    /// raised.
    async fn execute_tool(
        &self,
        name: &str,
        input: &JsonValue,
        scope: &TurnScope<'_>,
    ) -> (String, bool, Option<FileContextReport>) {
        match name {
            STORE_FILES => {
                let input: StoreFilesInput = match serde_json::from_value(input.clone()) {
                    Ok(input) => input,
                    Err(e) => return (format!("Invalid store_files input: {}", e), true, None),
                };
                match self.store_staged(input, scope).await {
                    Ok(report) => (report.message.clone(), !report.success, Some(report)),
                    Err(e) => {
                        tracing::error!(stage = "chat", tool = name, error = %e, "Tool failed");
                        (e.client_message(), true, None)
                    }
                }
            }
            LIST_CLIENT_FILES => {
                let input: ListClientFilesInput = match serde_json::from_value(input.clone()) {
                    Ok(input) => input,
                    Err(e) => {
                        return (format!("Invalid list_client_files input: {}", e), true, None)
                    }
                };
                let limit = input
                    .limit
                    .unwrap_or(DEFAULT_LIST_LIMIT)
                    .clamp(1, MAX_LIST_LIMIT);
                match self
                    .records
                    .list_for_client(&input.client_name, None, limit)
                    .await
                {
                    Ok(files) if files.is_empty() => (
                        format!("No files are stored for client {}.", input.client_name),
                        false,
                        None,
                    ),
                    Ok(files) => {
                        let files: Vec<StoredFile> = files.into_iter().map(Into::into).collect();
                        (stored_message(&files, Some(&input.client_name)), false, None)
                    }
                    Err(e) => {
                        tracing::warn!(stage = "chat", tool = name, error = %e, "Tool failed");
                        (e.client_message(), true, None)
                    }
                }
            }
            other => (format!("Unknown tool: {}", other), true, None),
        }
    }

    /// Promote the conversation's staged files (optionally a subset). Staged
    /// files are passed explicitly so the bridge goes straight to promotion
    /// even when the client already has stored files.
    async fn store_staged(
        &self,
        input: StoreFilesInput,
        scope: &TurnScope<'_>,
    ) -> Result<FileContextReport, AppError> {
        let client_name = input
            .client_name
            .filter(|c| !c.trim().is_empty())
            .or_else(|| scope.client_name.map(String::from));

        let files: Vec<FilePayload> = match scope.conversation_id {
            Some(conversation_id) => {
                let key = ConversationKey::new(scope.uploaded_by, conversation_id);
                let cached = self.cache.files(&key).await;
                filter_temp_ids(cached, input.temp_ids.as_deref())
                    .into_iter()
                    .map(FilePayload::from)
                    .collect()
            }
            None => Vec::new(),
        };

        self.bridge
            .report(ContextRequest {
                conversation_id: scope.conversation_id.map(String::from),
                client_name,
                files,
                uploaded_by: scope.uploaded_by,
                ..Default::default()
            })
            .await
    }
}

fn system_prompt(snapshot: &FileContextReport) -> String {
    let client = match &snapshot.client_name {
        Some(name) => format!("The current client is {}.\n", name),
        None => "No client has been identified yet.\n".to_string(),
    };
    format!(
        "You are the intake assistant for a legal practice. You help staff file \
         client documents.\n{}\n\
         Current file state for this conversation. This is authoritative: do not \
         contradict it and do not claim files exist that are not listed here or \
         returned by a tool.\n{}\n\n\
         Call store_files when the user asks to save the uploaded files. Call \
         list_client_files to look up what is stored for a client.",
        client, snapshot.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ClientResolver;
    use crate::staging_cache::StagingLimits;
    use crate::test_helpers::*;
    use crate::writer::FileStoreWriter;
    use casedesk_core::models::{ContextSource, StagedFile};
    use serde_json::json;

    struct Harness {
        model: ScriptedModel,
        records: MockFileRecordStore,
        cache: Arc<StagingCache>,
        orchestrator: ChatOrchestrator,
    }

    fn harness_with(model: Option<ScriptedModel>, clients: &[&str]) -> Harness {
        let records = MockFileRecordStore::new();
        let cache = Arc::new(StagingCache::new(StagingLimits::default()));
        let writer = FileStoreWriter::new(
            Some(Arc::new(MockStorage::new())),
            Arc::new(records.clone()),
            ClientResolver::with_default_threshold(Arc::new(MockClientDirectory::with_clients(
                clients,
            ))),
        );
        let bridge = ContextBridge::new(Arc::new(records.clone()), writer, cache.clone(), 24, 20);
        let scripted = model.clone().unwrap_or_default();
        let orchestrator = ChatOrchestrator::new(
            model.map(|m| Arc::new(m) as Arc<dyn LanguageModel>),
            bridge,
            Arc::new(records.clone()),
            cache.clone(),
            DEFAULT_MAX_TOOL_ROUNDS,
        );
        Harness {
            model: scripted,
            records,
            cache,
            orchestrator,
        }
    }

    fn harness(clients: &[&str]) -> Harness {
        harness_with(Some(ScriptedModel::new()), clients)
    }

    fn user_says(text: &str) -> Vec<ChatTurn> {
        vec![ChatTurn {
            role: Role::User,
            content: text.to_string(),
        }]
    }

    fn staged(filename: &str, content_type: &str) -> StagedFile {
        let p = payload(filename, content_type, 32);
        StagedFile {
            temp_id: p.temp_id.unwrap(),
            filename: p.filename,
            content_type: p.content_type,
            size: p.size,
            file_buffer: p.file_buffer.unwrap(),
        }
    }

    #[tokio::test]
    async fn test_missing_model_is_configuration_error() {
        let h = harness_with(None, &[]);
        let err = h
            .orchestrator
            .respond(ChatRequest {
                messages: user_says("hello"),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_requires_trailing_user_message() {
        let h = harness(&[]);
        let err = h
            .orchestrator
            .respond(ChatRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_snapshot_is_injected_as_ground_truth() {
        let h = harness(&["sally"]);
        h.records
            .add_file(durable_file("sally", "retainer.pdf", "application/pdf"));
        h.model.push_text("Sally has retainer.pdf on file.");

        let reply = h
            .orchestrator
            .respond(ChatRequest {
                client_name: Some("sally".to_string()),
                messages: user_says("What do we have for Sally?"),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(reply.reply, "Sally has retainer.pdf on file.");
        assert!(reply.tool_calls.is_empty());
        assert_eq!(reply.file_context.source, ContextSource::DurableStore);

        let requests = h.model.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system.contains("retainer.pdf (PDF)"));
        assert_eq!(requests[0].tools.len(), 2);
    }

    #[tokio::test]
    async fn test_store_files_tool_promotes_staged_files() {
        let h = harness(&["sally"]);
        h.records
            .add_file(durable_file("sally", "old.pdf", "application/pdf"));
        h.cache
            .push(
                &ConversationKey::new(None, "conv-1"),
                staged("document.docx", DOCX_CONTENT_TYPE),
            )
            .await
            .unwrap();
        h.model
            .push_tool_use("toolu_1", STORE_FILES, json!({"client_name": "sally"}))
            .push_text("Saved document.docx for Sally.");

        let reply = h
            .orchestrator
            .respond(ChatRequest {
                conversation_id: Some("conv-1".to_string()),
                client_name: Some("sally".to_string()),
                messages: user_says("Please save this for Sally"),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(reply.tool_calls.len(), 1);
        let call = &reply.tool_calls[0];
        assert!(!call.is_error);
        assert!(call.output.contains("document.docx"));
        assert_eq!(reply.file_context.source, ContextSource::Promoted);
        assert!(h.cache.files(&ConversationKey::new(None, "conv-1")).await.is_empty());
        assert_eq!(h.records.files().len(), 2);

        // Snapshot listed the staged upload; the tool result went back to the model
        let requests = h.model.requests();
        assert!(requests[0].system.contains("document.docx (document)"));
        let last = requests[1].messages.last().unwrap();
        assert!(matches!(
            &last.content[0],
            ContentBlock::ToolResult { tool_use_id, is_error: false, .. } if tool_use_id == "toolu_1"
        ));
    }

    #[tokio::test]
    async fn test_list_client_files_tool() {
        let h = harness(&[]);
        h.records
            .add_file(durable_file("Acme LLC", "contract.docx", DOCX_CONTENT_TYPE));
        h.model
            .push_tool_use("toolu_1", LIST_CLIENT_FILES, json!({"client_name": "acme llc"}))
            .push_text("Acme has one contract.");

        let reply = h
            .orchestrator
            .respond(ChatRequest {
                messages: user_says("What is on file for Acme?"),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(reply.tool_calls[0].output.contains("contract.docx (document)"));
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_input_are_reported_to_model() {
        let h = harness(&[]);
        h.model
            .push_tool_use("toolu_1", "delete_everything", json!({}))
            .push_tool_use("toolu_2", LIST_CLIENT_FILES, json!({"limit": 3}));

        let reply = h
            .orchestrator
            .respond(ChatRequest {
                messages: user_says("hi"),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(reply.tool_calls.len(), 2);
        assert!(reply.tool_calls.iter().all(|c| c.is_error));
        assert_eq!(reply.reply, "Done.");
    }

    #[tokio::test]
    async fn test_tool_rounds_are_bounded() {
        let h = harness(&[]);
        for i in 0..10 {
            h.model.push_tool_use(
                &format!("toolu_{}", i),
                LIST_CLIENT_FILES,
                json!({"client_name": "sally"}),
            );
        }

        let reply = h
            .orchestrator
            .respond(ChatRequest {
                messages: user_says("loop"),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(reply.tool_calls.len(), DEFAULT_MAX_TOOL_ROUNDS);
        assert_eq!(h.model.requests().len(), DEFAULT_MAX_TOOL_ROUNDS + 1);
        assert!(reply.reply.contains("could not finish"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_upstream_error() {
        let h = harness(&[]);
        h.model.push_error("overloaded");

        let err = h
            .orchestrator
            .respond(ChatRequest {
                messages: user_says("hello"),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
