//! Casedesk Services Layer
//!
//! File staging, promotion to durable storage, client association and the AI
//! context bridge, plus the chat orchestrator that sits on top of them. The
//! API crate depends on this facade and keeps its handlers thin.

pub mod anthropic;
pub mod bridge;
pub mod llm;
pub mod orchestrator;
pub mod resolver;
pub mod staging;
pub mod staging_cache;
pub mod tools;
pub mod writer;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use anthropic::AnthropicClient;
pub use bridge::{ContextBridge, ContextRequest};
pub use llm::{ContentBlock, LanguageModel, Message, ModelRequest, ModelResponse, Role};
pub use orchestrator::{ChatOrchestrator, ChatReply, ChatRequest, ChatTurn, ToolExecution};
pub use resolver::{ClientResolver, Resolution};
pub use staging::StagingService;
pub use staging_cache::{ConversationKey, StagingCache, StagingLimits};
pub use writer::{FileStoreWriter, StoreRequest};

pub use casedesk_storage::{create_storage, Storage, StorageBackend, StorageError};
