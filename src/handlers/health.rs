//! Health and stats endpoints.

use axum::extract::State;
use axum::response::Json;

use super::state::AppState;
use super::types::{HealthResponse, StatsResponse};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let store = state.store();
    Json(StatsResponse {
        entities: store.entity_count(),
        conversations: store.conversation_count(),
        messages: store.message_count(),
    })
}
