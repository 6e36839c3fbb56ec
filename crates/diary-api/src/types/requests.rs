//! Request DTOs for the API.
//!
//! Clients disagree on field names, so bodies are read as loose JSON and each
//! field is taken from the first alias carrying a non-empty string.

use serde_json::Value;

use diary_agent::{ImageRequest, ReportRequest};

/// Text aliases accepted by `/agent`, in precedence order.
pub const AGENT_TEXT_FIELDS: &[&str] = &["content", "inputText", "input", "user_input"];

/// Date aliases accepted by `/agent`, in precedence order.
pub const AGENT_DATE_FIELDS: &[&str] = &["record_date", "current_date"];

/// Text aliases accepted by the secondary endpoints.
pub const REQUEST_TEXT_FIELDS: &[&str] = &["content", "request"];

/// Parse a request body, treating anything but a JSON object as empty.
pub fn parse_body(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::Null,
    }
}

/// First non-empty string among `keys`. Whitespace counts as content.
pub fn first_text(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match body.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

fn text(body: &Value, key: &str) -> Option<String> {
    first_text(body, &[key])
}

/// An identifier sent either as a string or a number.
fn id(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::Number(n) => Some(n.to_string()),
        _ => text(body, key),
    }
}

/// `POST /agent` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentRequest {
    /// User input.
    pub content: Option<String>,
    /// Requesting user.
    pub user_id: Option<String>,
    /// Date context for the answer.
    pub record_date: Option<String>,
}

impl AgentRequest {
    /// Read the request from a loose body.
    pub fn from_body(body: &Value) -> Self {
        Self {
            content: first_text(body, AGENT_TEXT_FIELDS),
            user_id: id(body, "user_id"),
            record_date: first_text(body, AGENT_DATE_FIELDS),
        }
    }
}

/// Read an image request. `None` when the request text is missing.
pub fn image_request(body: &Value) -> Option<ImageRequest> {
    Some(ImageRequest {
        request: first_text(body, REQUEST_TEXT_FIELDS)?,
        user_id: id(body, "user_id"),
        text: text(body, "text"),
        image_base64: text(body, "image_base64"),
        record_date: text(body, "record_date"),
    })
}

/// Read a report request. `None` when the request text is missing.
///
/// `report_id` may arrive as a number or a numeric string.
pub fn report_request(body: &Value) -> Option<ReportRequest> {
    Some(ReportRequest {
        request: first_text(body, REQUEST_TEXT_FIELDS)?,
        user_id: id(body, "user_id"),
        start_date: text(body, "start_date"),
        end_date: text(body, "end_date"),
        report_id: id(body, "report_id").and_then(|raw| raw.trim().parse().ok()),
    })
}

/// `POST /agent/summarize` body.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizeRequest {
    /// Notes to turn into a diary entry.
    pub content: String,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
}

impl SummarizeRequest {
    /// Read the request. `None` when `content` is missing.
    pub fn from_body(body: &Value) -> Option<Self> {
        Some(Self {
            content: text(body, "content")?,
            temperature: body
                .get("temperature")
                .and_then(Value::as_f64)
                .map(|t| t as f32),
        })
    }
}
