//! Orchestration handler.

use axum::{body::Bytes, extract::State, Json};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use diary_orchestrator::OrchestrationResult;

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{parse_body, AgentRequest};

/// POST /agent - Store diary data or answer a question.
///
/// Routing runs on its own task so that a panicking collaborator turns into a
/// 500 envelope rather than a dropped connection.
pub async fn agent(State(state): State<AppState>, body: Bytes) -> Result<Json<OrchestrationResult>> {
    let request = AgentRequest::from_body(&parse_body(&body));
    let Some(input) = request.content else {
        warn!("Agent request without input");
        return Err(ApiError::InputRequired);
    };

    let request_id = Uuid::new_v4();
    info!(
        request_id = %request_id,
        user_id = request.user_id.as_deref().unwrap_or("-"),
        input = %diary_core::preview(&input, 100),
        "Agent request received"
    );

    let router = state.router.clone();
    let user_id = request.user_id;
    let record_date = request.record_date;
    let task = tokio::spawn(
        async move {
            router
                .route(&input, user_id.as_deref(), record_date.as_deref())
                .await
        }
        .instrument(info_span!("route", request_id = %request_id)),
    );

    match task.await {
        Ok(result) => Ok(Json(result.normalized())),
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Routing task failed");
            Err(ApiError::ProcessingFailed(e.to_string()))
        }
    }
}
