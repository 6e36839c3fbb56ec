//! Weekly report handler.

use axum::{body::Bytes, extract::State, Json};
use tracing::{error, info};

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{parse_body, report_request, ReportResponse};

/// POST /agent/report - Create, list or inspect weekly reports.
pub async fn report(State(state): State<AppState>, body: Bytes) -> Result<Json<ReportResponse>> {
    let request = report_request(&parse_body(&body)).ok_or(ApiError::ContentRequired)?;
    info!(
        user_id = request.user_id.as_deref().unwrap_or("-"),
        report_id = ?request.report_id,
        "Report request received"
    );

    let response = state.reports.run(&request).await.map_err(|e| {
        error!(error = %e, "Report agent failed");
        ApiError::endpoint("report", e)
    })?;

    Ok(Json(ReportResponse {
        success: true,
        response,
    }))
}
