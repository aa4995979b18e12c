//! Memory storage and semantic search endpoints.

use axum::extract::State;
use axum::response::Json;
use tracing::info;

use super::state::AppState;
use super::types::{SearchRequest, SearchResponse, StoreMemoryRequest, StoreMemoryResponse};
use crate::errors::Result;
use crate::validation;

/// Store one message: extract entities, merge them into the graph, and thread
/// the message into the user's current-day conversation.
pub async fn store_memory(
    State(state): State<AppState>,
    Json(request): Json<StoreMemoryRequest>,
) -> Result<Json<StoreMemoryResponse>> {
    validation::validate_user_id(&request.user_id)?;
    validation::validate_content(&request.content)?;

    let processed = state
        .graph()
        .process_message(
            &request.content,
            request.role,
            &request.user_id,
            request.tools_used,
        )
        .await?;

    info!(
        user_id = %request.user_id,
        entities = processed.entities.len(),
        "stored message"
    );

    Ok(Json(StoreMemoryResponse {
        message_id: processed.message_id,
        entities: processed.entities,
    }))
}

/// Semantic search over stored entities, optionally filtered by type.
pub async fn search_memory(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    validation::validate_content(&request.query)?;
    validation::validate_limit(request.limit)?;

    let results = state
        .rag()
        .semantic_search_filtered(&request.query, request.limit, request.entity_types.as_deref())
        .await?;

    Ok(Json(SearchResponse {
        count: results.len(),
        results,
    }))
}
