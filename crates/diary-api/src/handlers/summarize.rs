//! Diary summarization handler.

use axum::{body::Bytes, extract::State, Json};
use tracing::error;

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{parse_body, SummarizeRequest, SummarizeResponse};

/// POST /agent/summarize - Write a diary entry from notes.
pub async fn summarize(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SummarizeResponse>> {
    let request = SummarizeRequest::from_body(&parse_body(&body)).ok_or(ApiError::ContentRequired)?;

    let response = state
        .summarizer
        .summarize(&request.content, request.temperature)
        .await
        .map_err(|e| {
            error!(error = %e, "Summarizer failed");
            ApiError::endpoint("summarize", e)
        })?;

    Ok(Json(SummarizeResponse { response }))
}
