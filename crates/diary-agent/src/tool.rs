//! Tool definitions, calls and results for agent sessions.
//!
//! A [`Tool`] is an async callable the model can invoke by name. Tools are
//! grouped into a [`ToolSet`] owned by a single session, which turns every
//! invocation (including failures) into a [`ToolResult`] so the tool loop never
//! aborts because one tool misbehaved.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{AgentError, Result};
use crate::history::ContentBlock;

/// Schema description of a tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name the model uses to call it.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier, echoed back in the result.
    pub id: String,
    /// Name of the tool to run.
    pub name: String,
    /// Arguments object.
    pub arguments: Value,
}

impl ToolCall {
    /// Create a call with a fresh identifier.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self::with_id(format!("call-{}", uuid::Uuid::new_v4()), name, arguments)
    }

    /// Create a call with an explicit identifier.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome status of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// The tool ran to completion.
    Success,
    /// The tool failed; the output carries the error text.
    Error,
}

impl ToolStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Content produced by a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Ordered content blocks.
    pub blocks: Vec<ContentBlock>,
}

impl ToolOutput {
    /// A single JSON block.
    pub fn json(value: Value) -> Self {
        Self {
            blocks: vec![ContentBlock::Json(value)],
        }
    }

    /// A single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Several blocks in order.
    pub fn blocks(blocks: Vec<ContentBlock>) -> Self {
        Self { blocks }
    }

    /// First JSON block, if any.
    pub fn first_json(&self) -> Option<&Value> {
        self.blocks.iter().find_map(|block| match block {
            ContentBlock::Json(value) => Some(value),
            _ => None,
        })
    }

    /// Flatten the output into the text sent back to the chat model.
    pub fn to_model_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text(text) => Some(text.clone()),
                ContentBlock::Json(value) => Some(value.to_string()),
                ContentBlock::Unknown => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Result of one tool invocation, as recorded in the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Identifier of the call this answers.
    pub tool_call_id: String,
    /// Name of the tool that ran.
    pub tool_name: String,
    /// Success or error.
    pub status: ToolStatus,
    /// Produced content.
    pub output: ToolOutput,
}

impl ToolResult {
    /// Converse-style `toolResult` content block for the session history.
    pub fn to_history_block(&self) -> Value {
        json!({
            "toolResult": {
                "toolUseId": self.tool_call_id,
                "status": self.status.as_str(),
                "content": self.output.blocks.iter().map(ContentBlock::to_value).collect::<Vec<_>>(),
            }
        })
    }
}

/// An async tool the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition offered to the model.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the model-supplied arguments.
    async fn call(&self, arguments: &Value) -> Result<ToolOutput>;
}

/// The tools available to one session.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    /// Create an empty tool set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool.
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Add a shared tool.
    pub fn with_shared(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions of every registered tool.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Run a call, converting any failure into an error result.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        debug!(tool = %call.name, call_id = %call.id, "Executing tool");

        let outcome = match self
            .tools
            .iter()
            .find(|tool| tool.definition().name == call.name)
        {
            Some(tool) => tool.call(&call.arguments).await,
            None => Err(AgentError::ToolNotFound(call.name.clone())),
        };

        match outcome {
            Ok(output) => ToolResult {
                tool_call_id: call.id.clone(),
                tool_name: call.name.clone(),
                status: ToolStatus::Success,
                output,
            },
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult {
                    tool_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    status: ToolStatus::Error,
                    output: ToolOutput::text(format!("Error: {}", e)),
                }
            }
        }
    }
}

/// Read a required, non-empty string argument.
pub(crate) fn required_str<'a>(tool_name: &str, arguments: &'a Value, key: &str) -> Result<&'a str> {
    optional_str(arguments, key)
        .ok_or_else(|| AgentError::invalid_arguments(tool_name, format!("missing `{}`", key)))
}

/// Read an optional string argument, treating blanks as absent.
pub(crate) fn optional_str<'a>(arguments: &'a Value, key: &str) -> Option<&'a str> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Read an integer argument that models sometimes send as a string.
pub(crate) fn optional_i64(arguments: &Value, key: &str) -> Option<i64> {
    match arguments.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(
                "echo",
                "Echo the message",
                json!({"type": "object", "properties": {"message": {"type": "string"}}}),
            )
        }

        async fn call(&self, arguments: &Value) -> Result<ToolOutput> {
            let message = required_str("echo", arguments, "message")?;
            Ok(ToolOutput::json(json!({ "response": message })))
        }
    }

    #[tokio::test]
    async fn test_execute_success() {
        let tools = ToolSet::new().with(EchoTool);
        let call = ToolCall::with_id("call-1", "echo", json!({"message": "hi"}));

        let result = tools.execute(&call).await;
        assert_eq!(result.status, ToolStatus::Success);
        assert_eq!(result.output.first_json(), Some(&json!({"response": "hi"})));
    }

    #[tokio::test]
    async fn test_execute_unknown_tool_is_error_result() {
        let tools = ToolSet::new().with(EchoTool);
        let call = ToolCall::new("missing", json!({}));

        let result = tools.execute(&call).await;
        assert_eq!(result.status, ToolStatus::Error);
        assert!(result.output.to_model_text().contains("tool not found: missing"));
    }

    #[tokio::test]
    async fn test_execute_bad_arguments_is_error_result() {
        let tools = ToolSet::new().with(EchoTool);
        let call = ToolCall::new("echo", json!({"message": "  "}));

        let result = tools.execute(&call).await;
        assert_eq!(result.status, ToolStatus::Error);
    }

    #[test]
    fn test_history_block_shape() {
        let result = ToolResult {
            tool_call_id: "call-9".into(),
            tool_name: "echo".into(),
            status: ToolStatus::Success,
            output: ToolOutput::json(json!({"response": "ok"})),
        };

        assert_eq!(
            result.to_history_block(),
            json!({
                "toolResult": {
                    "toolUseId": "call-9",
                    "status": "success",
                    "content": [{"json": {"response": "ok"}}]
                }
            })
        );
    }

    #[test]
    fn test_argument_helpers() {
        let args = json!({"limit": "7", "count": 3, "name": " x "});
        assert_eq!(optional_i64(&args, "limit"), Some(7));
        assert_eq!(optional_i64(&args, "count"), Some(3));
        assert_eq!(optional_str(&args, "name"), Some("x"));
        assert!(optional_str(&args, "absent").is_none());
    }

    #[test]
    fn test_model_text_joins_blocks() {
        let output = ToolOutput::blocks(vec![
            ContentBlock::Text("first".into()),
            ContentBlock::Unknown,
            ContentBlock::Json(json!({"a": 1})),
        ]);
        assert_eq!(output.to_model_text(), "first\n\n{\"a\":1}");
    }
}
