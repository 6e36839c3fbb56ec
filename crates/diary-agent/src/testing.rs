//! Scripted collaborators for tests.
//!
//! Enabled inside this crate's tests and, for other crates, through the
//! `testing` feature.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{ChatMessage, ChatModel, ChatResponse, ChatTool};
use crate::config::ModelConfig;
use crate::error::{AgentError, Result};

/// A recorded chat request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Model the request targeted.
    pub model: String,
    /// Temperature sent.
    pub temperature: f32,
    /// Messages sent.
    pub messages: Vec<ChatMessage>,
    /// Names of the tools offered.
    pub tool_names: Vec<String>,
}

/// A chat model that replays queued responses and records every request.
///
/// When the script runs out, further calls fail with a model error.
#[derive(Default)]
pub struct ScriptedChatModel {
    script: Mutex<VecDeque<Result<ChatResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedChatModel {
    /// Create a model with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn then(self, response: ChatResponse) -> Self {
        self.push(Ok(response));
        self
    }

    /// Queue a plain text response.
    pub fn then_text(self, text: &str) -> Self {
        self.then(ChatResponse::text(text))
    }

    /// Queue a failure.
    pub fn then_error(self, message: &str) -> Self {
        self.push(Err(AgentError::ModelInvocation(message.to_string())));
        self
    }

    fn push(&self, item: Result<ChatResponse>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
    }

    /// Number of chat calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// All recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn chat(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ChatTool>>,
    ) -> Result<ChatResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                model: config.model.clone(),
                temperature: config.temperature,
                messages,
                tool_names: tools
                    .unwrap_or_default()
                    .iter()
                    .map(|t| t.function.name.clone())
                    .collect(),
            });
        }

        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| Err(AgentError::ModelInvocation("script exhausted".into())))
    }
}
