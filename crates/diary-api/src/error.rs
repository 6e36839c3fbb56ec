//! API error types.
//!
//! The orchestration endpoint answers errors in the same `{type, content,
//! message}` shape as its results; the secondary endpoints use a
//! `{success: false, error}` envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use diary_orchestrator::OrchestrationResult;

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// API error type for consistent error responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `/agent` called without any input text.
    #[error("input required")]
    InputRequired,

    /// `/agent` failed outside the router's own error handling.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// A secondary endpoint called without request text.
    #[error("request content required")]
    ContentRequired,

    /// A secondary endpoint's collaborator failed.
    #[error("{endpoint} failed: {message}")]
    EndpointFailed {
        /// Endpoint name, e.g. `image`.
        endpoint: &'static str,
        /// Underlying cause.
        message: String,
    },
}

impl ApiError {
    /// Build an [`ApiError::EndpointFailed`].
    pub fn endpoint(endpoint: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::EndpointFailed {
            endpoint,
            message: cause.to_string(),
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InputRequired | ApiError::ContentRequired => StatusCode::BAD_REQUEST,
            ApiError::ProcessingFailed(_) | ApiError::EndpointFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::InputRequired | ApiError::ProcessingFailed(_) => {
                (status, Json(OrchestrationResult::error(self.to_string()))).into_response()
            }
            ApiError::ContentRequired | ApiError::EndpointFailed { .. } => (
                status,
                Json(json!({
                    "success": false,
                    "error": self.to_string()
                })),
            )
                .into_response(),
        }
    }
}
