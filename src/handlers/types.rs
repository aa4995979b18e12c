//! Request and response types for the REST API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::TimelineEntry;
use crate::types::{Entity, EntityType, MessageRole};

fn default_limit() -> usize {
    10
}

fn default_role() -> MessageRole {
    MessageRole::User
}

// =============================================================================
// MEMORY STORE / SEARCH
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StoreMemoryRequest {
    pub user_id: String,
    pub content: String,
    #[serde(default = "default_role")]
    pub role: MessageRole,
    #[serde(default)]
    pub tools_used: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StoreMemoryResponse {
    pub message_id: Uuid,
    /// Store-resolved entities mentioned by the message, post-merge.
    pub entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Optional post-filter on entity type.
    #[serde(default)]
    pub entity_types: Option<Vec<EntityType>>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<Entity>,
    pub count: usize,
}

// =============================================================================
// CONTEXT INJECTION
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct InjectRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct InjectResponse {
    /// The message, with relevant context prepended when a cue fired.
    pub prompt: String,
    pub injected: bool,
}

// =============================================================================
// ENTITY RESOLUTION / TIMELINE
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub reference: String,
    /// Recent message texts, oldest first.
    #[serde(default)]
    pub context: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub found: bool,
    pub entity: Option<Entity>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineParams {
    pub name: String,
    #[serde(default)]
    pub entity_type: Option<EntityType>,
    /// Maximum timeline entries returned, newest first.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub found: bool,
    pub entity: Option<Entity>,
    pub timeline: Vec<TimelineEntry>,
}

// =============================================================================
// CONVERSATION ANALYSIS
// =============================================================================

fn default_period_days() -> u32 {
    7
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub user_id: String,
    /// Reporting window echoed back in the analysis.
    #[serde(default = "default_period_days")]
    pub days: u32,
}

// =============================================================================
// HEALTH / STATS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub entities: usize,
    pub conversations: usize,
    pub messages: usize,
}
