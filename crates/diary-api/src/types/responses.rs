//! Response DTOs for the API.

use serde::Serialize;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Report agent response.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    /// Always `true`; failures use the error envelope.
    pub success: bool,
    /// Agent answer.
    pub response: String,
}

/// Summarizer response.
#[derive(Debug, Clone, Serialize)]
pub struct SummarizeResponse {
    /// Generated diary entry.
    pub response: String,
}
