//! Context injection endpoint.

use axum::extract::State;
use axum::response::Json;
use tracing::debug;

use super::state::AppState;
use super::types::{InjectRequest, InjectResponse};
use crate::errors::Result;
use crate::validation;

/// Return the message with relevant memory prepended when it carries a
/// recall cue; otherwise echo it unchanged.
pub async fn inject_context(
    State(state): State<AppState>,
    Json(request): Json<InjectRequest>,
) -> Result<Json<InjectResponse>> {
    validation::validate_user_id(&request.user_id)?;
    validation::validate_content(&request.message)?;

    let prompt = state
        .injector()
        .inject(&request.message, &request.user_id)
        .await?;
    let injected = prompt != request.message;

    debug!(user_id = %request.user_id, injected, "context injection");

    Ok(Json(InjectResponse { prompt, injected }))
}
