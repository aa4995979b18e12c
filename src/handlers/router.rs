//! Router configuration: centralized route definitions.

use axum::{
    Router,
    routing::{get, post},
};

use super::state::AppState;
use super::{context, conversations, entity, health, memory};

/// Build the full API router over the shared engine state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // =================================================================
        // HEALTH & STATS
        // =================================================================
        .route("/health", get(health::health))
        .route("/api/stats", get(health::stats))
        // =================================================================
        // MEMORY
        // =================================================================
        .route("/api/memory/store", post(memory::store_memory))
        .route("/api/memory/search", post(memory::search_memory))
        // =================================================================
        // CONTEXT
        // =================================================================
        .route("/api/context/inject", post(context::inject_context))
        // =================================================================
        // ENTITIES & CONVERSATIONS
        // =================================================================
        .route("/api/entity/resolve", post(entity::resolve_entity))
        .route("/api/entity/timeline", get(entity::entity_timeline))
        .route(
            "/api/conversations/analyze",
            post(conversations::analyze_conversations),
        )
        .with_state(state)
}
