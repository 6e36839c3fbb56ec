//! Session history in the Converse message shape.
//!
//! Each message is a JSON object `{"role": ..., "content": [block, ...]}` where
//! a block is one of `{"text": ...}`, `{"json": ...}`, `{"toolUse": ...}` or
//! `{"toolResult": {"toolUseId", "status", "content": [...]}}`. History is kept
//! as opaque JSON so it can be inspected without trusting its structure;
//! [`ContentBlock::decode`] and [`ToolResultEntry::decode`] never fail.

use serde_json::{json, Value};

use crate::tool::{ToolCall, ToolResult};

/// A decoded content block of a tool result.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// Plain text.
    Text(String),
    /// Structured JSON payload.
    Json(Value),
    /// Anything else; ignored by extraction.
    Unknown,
}

impl ContentBlock {
    /// Decode a raw block. Total: unrecognized shapes become [`ContentBlock::Unknown`].
    pub fn decode(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::Unknown;
        };
        if let Some(text) = obj.get("text").and_then(Value::as_str) {
            return Self::Text(text.to_string());
        }
        match obj.get("json") {
            Some(payload) => Self::Json(payload.clone()),
            None => Self::Unknown,
        }
    }

    /// Encode back into the raw block shape.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => json!({ "text": text }),
            Self::Json(payload) => json!({ "json": payload }),
            Self::Unknown => json!({}),
        }
    }
}

/// One `toolResult` block found in a history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolResultEntry {
    /// Identifier of the originating tool call.
    pub tool_use_id: Option<String>,
    /// Reported status, usually `success` or `error`.
    pub status: Option<String>,
    /// Decoded content blocks in order.
    pub blocks: Vec<ContentBlock>,
}

impl ToolResultEntry {
    /// Decode the body of a `toolResult` block. Returns `None` for non-objects.
    pub fn decode(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let blocks = obj
            .get("content")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(ContentBlock::decode).collect())
            .unwrap_or_default();

        Some(Self {
            tool_use_id: obj
                .get("toolUseId")
                .and_then(Value::as_str)
                .map(String::from),
            status: obj.get("status").and_then(Value::as_str).map(String::from),
            blocks,
        })
    }
}

/// A user message carrying plain text.
pub fn user_text(text: &str) -> Value {
    json!({ "role": "user", "content": [{ "text": text }] })
}

/// An assistant message with optional text and any tool uses.
pub fn assistant(text: Option<&str>, tool_calls: &[ToolCall]) -> Value {
    let mut content = Vec::with_capacity(tool_calls.len() + 1);
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        content.push(json!({ "text": text }));
    }
    for call in tool_calls {
        content.push(json!({
            "toolUse": {
                "toolUseId": call.id,
                "name": call.name,
                "input": call.arguments,
            }
        }));
    }
    json!({ "role": "assistant", "content": content })
}

/// A user message returning tool results to the model.
pub fn tool_results(results: &[ToolResult]) -> Value {
    json!({
        "role": "user",
        "content": results.iter().map(ToolResult::to_history_block).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ToolOutput, ToolStatus};

    #[test]
    fn test_decode_blocks() {
        assert_eq!(
            ContentBlock::decode(&json!({"text": "hello"})),
            ContentBlock::Text("hello".into())
        );
        assert_eq!(
            ContentBlock::decode(&json!({"json": {"response": "r"}})),
            ContentBlock::Json(json!({"response": "r"}))
        );
        assert_eq!(ContentBlock::decode(&json!({"image": {}})), ContentBlock::Unknown);
        assert_eq!(ContentBlock::decode(&json!("bare string")), ContentBlock::Unknown);
        assert_eq!(ContentBlock::decode(&json!({"text": 5})), ContentBlock::Unknown);
    }

    #[test]
    fn test_decode_tool_result_entry() {
        let entry = ToolResultEntry::decode(&json!({
            "toolUseId": "t1",
            "status": "success",
            "content": [{"text": "a"}, 42]
        }))
        .unwrap();

        assert_eq!(entry.tool_use_id.as_deref(), Some("t1"));
        assert_eq!(entry.status.as_deref(), Some("success"));
        assert_eq!(
            entry.blocks,
            vec![ContentBlock::Text("a".into()), ContentBlock::Unknown]
        );

        assert!(ToolResultEntry::decode(&json!(["not", "an", "object"])).is_none());
        let empty = ToolResultEntry::decode(&json!({"content": "oops"})).unwrap();
        assert!(empty.blocks.is_empty());
    }

    #[test]
    fn test_message_builders() {
        let call = ToolCall::with_id("c1", "retrieve", json!({"text": "q"}));
        let msg = assistant(Some(""), std::slice::from_ref(&call));
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["content"].as_array().unwrap().len(), 1);
        assert_eq!(msg["content"][0]["toolUse"]["name"], "retrieve");

        let result = ToolResult {
            tool_call_id: "c1".into(),
            tool_name: "retrieve".into(),
            status: ToolStatus::Success,
            output: ToolOutput::text("passage"),
        };
        let msg = tool_results(&[result]);
        assert_eq!(msg["content"][0]["toolResult"]["content"][0]["text"], "passage");

        assert_eq!(user_text("hi")["content"][0]["text"], "hi");
    }
}
