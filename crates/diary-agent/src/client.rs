//! Chat completions client with tool calling.
//!
//! [`ChatModel`] is the seam every agent talks through. [`ChatClient`] is the
//! production implementation against any OpenAI-compatible
//! `/chat/completions` endpoint (OpenRouter, a Bedrock gateway, a local proxy).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use diary_core::LlmConfig;

use crate::config::ModelConfig;
use crate::error::{AgentError, Result};
use crate::tool::{ToolCall, ToolDefinition};

/// A chat model that can answer a conversation, optionally calling tools.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a chat completion request.
    async fn chat(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ChatTool>>,
    ) -> Result<ChatResponse>;
}

/// HTTP client for an OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ChatClient {
    /// Create a client for the given base URL (without `/chat/completions`).
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// Create a client from the application's LLM settings.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn chat(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ChatTool>>,
    ) -> Result<ChatResponse> {
        let request = ChatRequest {
            model: config.model.clone(),
            messages,
            tools,
            max_tokens: Some(config.max_tokens),
            temperature: Some(config.temperature),
            top_k: config.top_k,
        };

        trace!(?request, "Sending chat request");

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("X-Title", "Diary Agent")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AgentError::ModelInvocation(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::ModelInvocation(format!(
                "chat API error {}: {}",
                status, text
            )));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParse(format!("Failed to parse response: {}", e)))?;

        debug!(
            model = %config.model,
            total_tokens = response.usage.as_ref().map_or(0, |u| u.total_tokens),
            "Chat response received"
        );

        Ok(response)
    }
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,

    /// Conversation messages.
    pub messages: Vec<ChatMessage>,

    /// Available tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatTool>>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-k sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// A message in the chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: String,

    /// Text content of the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool calls made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ChatToolCall>>,

    /// Tool call ID for tool result messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn with_role(role: &str, content: Option<String>) -> Self {
        Self {
            role: role.to_string(),
            content,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", Some(content.into()))
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role("user", Some(content.into()))
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role("assistant", Some(content.into()))
    }

    /// Create an assistant message with tool calls.
    pub fn assistant_with_tools(content: Option<String>, tool_calls: Vec<ChatToolCall>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::with_role("assistant", content)
        }
    }

    /// Create a tool result message.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role("tool", Some(content.into()))
        }
    }
}

/// Tool call in a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatToolCall {
    /// Unique identifier for this tool call.
    pub id: String,

    /// Type of the tool call (always "function").
    #[serde(rename = "type")]
    pub call_type: String,

    /// Function details.
    pub function: ChatToolFunction,
}

impl ChatToolCall {
    /// Convert from internal ToolCall type.
    pub fn from_tool_call(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            call_type: "function".to_string(),
            function: ChatToolFunction {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
            },
        }
    }

    /// Convert to internal ToolCall type.
    ///
    /// Empty argument strings are read as an empty object.
    pub fn to_tool_call(&self) -> Result<ToolCall> {
        let raw = self.function.arguments.trim();
        let arguments = if raw.is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(raw).map_err(|e| {
                AgentError::ResponseParse(format!("Invalid tool arguments JSON: {}", e))
            })?
        };

        Ok(ToolCall::with_id(&self.id, &self.function.name, arguments))
    }
}

/// Function details in a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatToolFunction {
    /// Name of the function to call.
    pub name: String,

    /// JSON-encoded arguments.
    pub arguments: String,
}

/// Tool definition for the API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTool {
    /// Type of the tool (always "function").
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function definition.
    pub function: ToolDefinition,
}

impl ChatTool {
    /// Create from internal ToolDefinition.
    pub fn from_definition(def: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: def.clone(),
        }
    }
}

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Unique identifier for this completion.
    #[serde(default)]
    pub id: String,

    /// Completion choices.
    pub choices: Vec<ChatChoice>,

    /// Token usage information.
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

impl ChatResponse {
    /// A response carrying only text.
    pub fn text(content: impl Into<String>) -> Self {
        Self::from_message(Some(content.into()), None, "stop")
    }

    /// A response asking for tool calls.
    pub fn tool_calls_of(calls: &[ToolCall]) -> Self {
        let calls = calls.iter().map(ChatToolCall::from_tool_call).collect();
        Self::from_message(None, Some(calls), "tool_calls")
    }

    fn from_message(
        content: Option<String>,
        tool_calls: Option<Vec<ChatToolCall>>,
        finish_reason: &str,
    ) -> Self {
        Self {
            id: format!("gen-{}", uuid::Uuid::new_v4()),
            choices: vec![ChatChoice {
                index: 0,
                message: ResponseMessage {
                    role: "assistant".to_string(),
                    content,
                    tool_calls,
                },
                finish_reason: Some(finish_reason.to_string()),
            }],
            usage: None,
        }
    }

    /// Get the first choice's message.
    pub fn message(&self) -> Option<&ResponseMessage> {
        self.choices.first().map(|c| &c.message)
    }

    /// Text of the first choice, empty when absent.
    pub fn content(&self) -> String {
        self.message()
            .and_then(|m| m.content.clone())
            .unwrap_or_default()
    }

    /// Check if the response has tool calls.
    pub fn has_tool_calls(&self) -> bool {
        self.message()
            .and_then(|m| m.tool_calls.as_ref())
            .is_some_and(|calls| !calls.is_empty())
    }

    /// Get tool calls from the response, skipping undecodable ones.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.message()
            .and_then(|m| m.tool_calls.as_ref())
            .map_or(Vec::new(), |calls| {
                calls
                    .iter()
                    .filter_map(|c| c.to_tool_call().ok())
                    .collect()
            })
    }
}

/// A choice in the completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// Index of this choice.
    #[serde(default)]
    pub index: u32,

    /// The message for this choice.
    pub message: ResponseMessage,

    /// Finish reason (stop, tool_calls, length, etc.).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message in a completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Role (always "assistant" for responses).
    pub role: String,

    /// Text content of the response.
    pub content: Option<String>,

    /// Tool calls the model wants to make.
    #[serde(default)]
    pub tool_calls: Option<Vec<ChatToolCall>>,
}

/// Token usage information.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,

    /// Tokens in the completion.
    pub completion_tokens: u32,

    /// Total tokens used.
    pub total_tokens: u32,
}
