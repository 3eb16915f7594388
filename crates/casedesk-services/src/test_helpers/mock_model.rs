//! Scripted language model.

use async_trait::async_trait;
use casedesk_core::AppError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::llm::{ContentBlock, LanguageModel, ModelRequest, ModelResponse};

/// Replays queued responses in order and records every request it receives.
/// When the queue is empty it answers with a fixed text reply.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    responses: Arc<Mutex<VecDeque<Result<ModelResponse, String>>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: &str) -> &Self {
        self.push_response(vec![ContentBlock::Text {
            text: text.to_string(),
        }])
    }

    pub fn push_tool_use(&self, id: &str, name: &str, input: serde_json::Value) -> &Self {
        self.push_response(vec![ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }])
    }

    pub fn push_response(&self, content: Vec<ContentBlock>) -> &Self {
        let stop_reason = if content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
        {
            "tool_use"
        } else {
            "end_turn"
        };
        self.responses.lock().unwrap().push_back(Ok(ModelResponse {
            content,
            stop_reason: Some(stop_reason.to_string()),
        }));
        self
    }

    pub fn push_error(&self, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, AppError> {
        self.requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(AppError::Upstream(message)),
            None => Ok(ModelResponse {
                content: vec![ContentBlock::Text {
                    text: "Done.".to_string(),
                }],
                stop_reason: Some("end_turn".to_string()),
            }),
        }
    }
}
