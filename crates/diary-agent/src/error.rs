//! Error types for the agent crate.

use thiserror::Error;

/// Errors that can occur in agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Tool execution failed.
    #[error("tool execution failed: {tool_name}: {message}")]
    ToolExecution {
        /// Name of the tool that failed.
        tool_name: String,
        /// Error message.
        message: String,
    },

    /// The model asked for a tool that is not registered.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid tool arguments.
    #[error("invalid tool arguments for {tool_name}: {message}")]
    InvalidArguments {
        /// Name of the tool.
        tool_name: String,
        /// Error message.
        message: String,
    },

    /// Model invocation failed.
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    /// Response parsing failed.
    #[error("failed to parse response: {0}")]
    ResponseParse(String),

    /// A downstream HTTP collaborator failed.
    #[error("{service} request failed: {message}")]
    Backend {
        /// Collaborator name (retrieval, image, object store, report).
        service: &'static str,
        /// Error message.
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Maximum iterations exceeded in tool loop.
    #[error("maximum iterations ({0}) exceeded in tool execution loop")]
    MaxIterationsExceeded(u32),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AgentError {
    /// Build a backend error for the named collaborator.
    pub fn backend(service: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Backend {
            service,
            message: message.to_string(),
        }
    }

    /// Build an invalid-arguments error for the named tool.
    pub fn invalid_arguments(tool_name: &str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool_name: tool_name.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
