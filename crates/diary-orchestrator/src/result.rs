//! The three-field result returned for every `/agent` request.

use serde::{Deserialize, Serialize};

/// Message for stored diary content.
pub const MESSAGE_SAVED: &str = "saved";
/// Message for a direct answer.
pub const MESSAGE_ANSWERED: &str = "answered";

/// Kind of result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// Input was stored as diary data.
    Data,
    /// Input was answered.
    Answer,
    /// Request could not be processed.
    Error,
}

/// Normalized orchestration outcome.
///
/// A `data` result always has empty `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// Result kind, serialized as `type`.
    #[serde(rename = "type")]
    pub kind: ResultType,
    /// Answer text; empty for data.
    #[serde(default)]
    pub content: String,
    /// Short status message.
    #[serde(default)]
    pub message: String,
}

impl OrchestrationResult {
    /// `{data, "", "saved"}`.
    pub fn saved() -> Self {
        Self {
            kind: ResultType::Data,
            content: String::new(),
            message: MESSAGE_SAVED.to_string(),
        }
    }

    /// `{answer, content, "answered"}`.
    pub fn answered(content: impl Into<String>) -> Self {
        Self {
            kind: ResultType::Answer,
            content: content.into(),
            message: MESSAGE_ANSWERED.to_string(),
        }
    }

    /// An answer that could not be generated.
    pub fn answer_failed(cause: impl std::fmt::Display) -> Self {
        Self {
            kind: ResultType::Answer,
            content: String::new(),
            message: format!("error generating answer: {}", cause),
        }
    }

    /// `{error, "", message}`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ResultType::Error,
            content: String::new(),
            message: message.into(),
        }
    }

    /// Enforce that data results carry no content.
    pub fn normalized(mut self) -> Self {
        if self.kind == ResultType::Data {
            self.content.clear();
        }
        self
    }

    /// Whether this is an answer with non-empty content.
    pub fn has_answer(&self) -> bool {
        self.kind == ResultType::Answer && !self.content.is_empty()
    }
}
