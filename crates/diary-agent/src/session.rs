//! Request-scoped agent session.
//!
//! An [`AgentSession`] is built for a single request: a system prompt, a model
//! configuration and a [`ToolSet`]. [`AgentSession::invoke`] runs the tool
//! calling loop until the model answers in plain text. The session keeps two
//! views of the conversation: the chat messages sent to the model and a
//! Converse-shaped history used for result extraction.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, trace};

use crate::client::{ChatMessage, ChatModel, ChatTool};
use crate::config::ModelConfig;
use crate::error::{AgentError, Result};
use crate::history;
use crate::tool::{ToolResult, ToolSet};

/// Maximum number of model round-trips per `invoke`.
pub const MAX_TOOL_ITERATIONS: u32 = 10;

/// A single-request conversation with a chat model.
pub struct AgentSession {
    model: Arc<dyn ChatModel>,
    config: ModelConfig,
    tools: ToolSet,
    messages: Vec<ChatMessage>,
    history: Vec<Value>,
    tool_results: Vec<ToolResult>,
}

impl AgentSession {
    /// Create a session with the given system prompt and no tools.
    pub fn new(
        model: Arc<dyn ChatModel>,
        config: ModelConfig,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model,
            config,
            tools: ToolSet::new(),
            messages: vec![ChatMessage::system(system_prompt)],
            history: Vec::new(),
            tool_results: Vec::new(),
        }
    }

    /// Set the tools offered to the model.
    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    /// Submit a user prompt and run the tool loop to a final text answer.
    pub async fn invoke(&mut self, prompt: &str) -> Result<String> {
        info!(
            prompt = %diary_core::preview(prompt, 50),
            tools = self.tools.definitions().len(),
            "Invoking agent session"
        );

        self.push_user(prompt);

        let chat_tools: Option<Vec<ChatTool>> = if self.tools.is_empty() {
            None
        } else {
            Some(
                self.tools
                    .definitions()
                    .iter()
                    .map(ChatTool::from_definition)
                    .collect(),
            )
        };

        let mut iteration = 0;
        loop {
            iteration += 1;
            if iteration > MAX_TOOL_ITERATIONS {
                return Err(AgentError::MaxIterationsExceeded(MAX_TOOL_ITERATIONS));
            }

            trace!(iteration, "Tool loop iteration");

            let response = self
                .model
                .chat(&self.config, self.messages.clone(), chat_tools.clone())
                .await?;

            if response.has_tool_calls() {
                let tool_calls = response.tool_calls();
                debug!(count = tool_calls.len(), "Received tool calls");

                let assistant_content = response.message().and_then(|m| m.content.clone());
                let chat_tool_calls: Vec<_> = response
                    .message()
                    .and_then(|m| m.tool_calls.clone())
                    .unwrap_or_default();
                self.history
                    .push(history::assistant(assistant_content.as_deref(), &tool_calls));
                self.messages.push(ChatMessage::assistant_with_tools(
                    assistant_content,
                    chat_tool_calls,
                ));

                let mut results = Vec::with_capacity(tool_calls.len());
                for call in &tool_calls {
                    let result = self.tools.execute(call).await;
                    self.messages
                        .push(ChatMessage::tool(&call.id, result.output.to_model_text()));
                    results.push(result);
                }
                self.history.push(history::tool_results(&results));
                self.tool_results.extend(results);

                continue;
            }

            let content = response.content();
            self.history.push(history::assistant(Some(&content), &[]));
            self.messages.push(ChatMessage::assistant(&content));
            return Ok(content);
        }
    }

    /// Ask the model to restate the conversation outcome as a JSON object.
    ///
    /// `schema` is an example object the answer must follow. No tools are
    /// offered for this turn. The raw model text is returned for the caller
    /// to parse.
    pub async fn structured_output(&mut self, instruction: &str, schema: &Value) -> Result<String> {
        let prompt = format!(
            "{}\n\n다음 형식의 JSON 객체 하나만 출력하시오. 다른 설명은 붙이지 마시오.\n{}",
            instruction, schema
        );
        self.push_user(&prompt);

        let response = self
            .model
            .chat(&self.config, self.messages.clone(), None)
            .await?;

        let content = response.content();
        self.history.push(history::assistant(Some(&content), &[]));
        self.messages.push(ChatMessage::assistant(&content));
        Ok(content)
    }

    /// Converse-shaped history of this session.
    pub fn history(&self) -> &[Value] {
        &self.history
    }

    /// Tool results in execution order.
    pub fn tool_results(&self) -> &[ToolResult] {
        &self.tool_results
    }

    /// Most recent tool result.
    pub fn last_tool_result(&self) -> Option<&ToolResult> {
        self.tool_results.last()
    }

    fn push_user(&mut self, prompt: &str) {
        self.history.push(history::user_text(prompt));
        self.messages.push(ChatMessage::user(prompt));
    }
}
