//! Image handler.

use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;
use tracing::{error, info};

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{image_request, parse_body};

/// POST /agent/image - Generate or upload a diary image.
///
/// The agent's payload is returned as-is.
pub async fn image(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let request = image_request(&parse_body(&body)).ok_or(ApiError::ContentRequired)?;
    info!(
        user_id = request.user_id.as_deref().unwrap_or("-"),
        has_text = request.text.is_some(),
        has_image = request.image_base64.is_some(),
        "Image request received"
    );

    let payload = state.images.run(request).await.map_err(|e| {
        error!(error = %e, "Image agent failed");
        ApiError::endpoint("image", e)
    })?;
    Ok(Json(payload))
}
