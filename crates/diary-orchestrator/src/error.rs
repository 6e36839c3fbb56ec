//! Error types for the orchestrator.

use thiserror::Error;

/// Orchestrator-specific errors.
///
/// These never leave [`Router::route`](crate::Router::route); they are turned
/// into an answer result carrying the error text.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Agent or collaborator error.
    #[error(transparent)]
    Agent(#[from] diary_agent::AgentError),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_is_transparent() {
        let err: OrchestratorError =
            diary_agent::AgentError::ModelInvocation("timeout".into()).into();
        assert_eq!(err.to_string(), "model invocation failed: timeout");
    }
}
