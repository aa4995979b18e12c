//! Conversation analysis endpoint.

use axum::extract::State;
use axum::response::Json;

use super::state::AppState;
use super::types::AnalyzeRequest;
use crate::errors::Result;
use crate::graph::ConversationAnalysis;
use crate::validation;

/// Aggregate statistics over the user's recent conversations: totals,
/// distinct entity count, and top topics by frequency.
pub async fn analyze_conversations(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<ConversationAnalysis>> {
    validation::validate_user_id(&request.user_id)?;

    let analysis = state
        .graph()
        .analyze_conversations(&request.user_id, request.days)
        .await?;

    Ok(Json(analysis))
}
