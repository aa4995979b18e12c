//! Entity reference resolution and timeline endpoints.

use axum::extract::{Query, State};
use axum::response::Json;

use super::state::AppState;
use super::types::{ResolveRequest, ResolveResponse, TimelineParams, TimelineResponse};
use crate::errors::Result;
use crate::store::{ConversationStore, EntityStore};
use crate::types::EntityType;
use crate::validation;

/// Resolve a pronoun or free-text reference against recent context.
/// An unresolvable reference answers `found: false`, not an error.
pub async fn resolve_entity(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>> {
    validation::validate_content(&request.reference)?;

    let entity = state
        .graph()
        .resolve_entity_reference(&request.reference, &request.context)
        .await?;

    Ok(Json(ResolveResponse {
        found: entity.is_some(),
        entity,
    }))
}

/// Conversations that mentioned the named entity, newest first, truncated
/// to `limit`.
///
/// Without an explicit type the lookup tries each entity type in turn and
/// takes the first hit. An unknown name answers `found: false`.
pub async fn entity_timeline(
    State(state): State<AppState>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<TimelineResponse>> {
    validation::validate_content(&params.name)?;
    validation::validate_limit(params.limit)?;

    let store = state.store();
    let entity = match params.entity_type {
        Some(entity_type) => store.find_by_name(&params.name, entity_type).await?,
        None => {
            let mut found = None;
            for entity_type in EntityType::ALL {
                if let Some(hit) = store.find_by_name(&params.name, entity_type).await? {
                    found = Some(hit);
                    break;
                }
            }
            found
        }
    };

    let Some(entity) = entity else {
        return Ok(Json(TimelineResponse {
            found: false,
            entity: None,
            timeline: Vec::new(),
        }));
    };

    let mut timeline = state.store().get_timeline(entity.id).await?;
    timeline.truncate(params.limit);
    Ok(Json(TimelineResponse {
        found: true,
        entity: Some(entity),
        timeline,
    }))
}
