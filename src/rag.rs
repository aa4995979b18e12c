//! Retrieval engine: embedding maintenance and semantic context assembly.
//!
//! Owns `Entity.embedding` exclusively: entities reach the store through
//! [`RetrievalEngine::add_entity`] with a freshly computed vector. Search is a
//! full scan over stored entities ranked by cosine similarity; at the corpus
//! sizes this engine targets that is cheaper than maintaining an index.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::embedder::Embedder;
use crate::errors::Result;
use crate::similarity::top_k_similar;
use crate::store::{EntityStore, merge_upsert};
use crate::types::{Entity, EntityType, Message};

/// Entities surfaced per query in assembled context.
const CONTEXT_SEARCH_LIMIT: usize = 3;

/// Most-recent observations rendered per entity.
const OBSERVATIONS_PER_ENTITY: usize = 2;

/// Trailing history messages rendered in the context block.
const HISTORY_TAIL: usize = 3;

/// Characters of each history message shown before truncation.
const MESSAGE_PREVIEW_CHARS: usize = 100;

pub struct RetrievalEngine {
    store: Arc<dyn EntityStore>,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalEngine {
    pub fn new(store: Arc<dyn EntityStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Compute an embedding from the entity's canonical text rendering and
    /// persist the entity through the merge-aware write path.
    pub async fn add_entity(&self, entity: Entity) -> Result<Entity> {
        let text = entity_text(&entity);
        let embedding = self.embedder.embed(&text).await?;

        let mut entity = entity;
        entity.embedding = Some(embedding);
        merge_upsert(self.store.as_ref(), entity).await
    }

    /// Rank stored entities against `query` by cosine similarity.
    ///
    /// Entities without an embedding are skipped, not errors; vector length
    /// mismatches score 0 inside the similarity kernel.
    pub async fn semantic_search(&self, query: &str, limit: usize) -> Result<Vec<Entity>> {
        let query_embedding = self.embedder.embed(query).await?;
        let all = self.store.get_all().await?;

        let candidates: Vec<(Vec<f32>, Entity)> = all
            .into_iter()
            .filter_map(|entity| {
                entity
                    .embedding
                    .clone()
                    .filter(|v| !v.is_empty())
                    .map(|v| (v, entity))
            })
            .collect();

        debug!(
            candidates = candidates.len(),
            limit, "semantic search over stored entities"
        );

        Ok(top_k_similar(&query_embedding, &candidates, limit)
            .into_iter()
            .map(|(_, entity)| entity)
            .collect())
    }

    /// Like [`semantic_search`](Self::semantic_search), optionally post-filtered
    /// by entity type.
    pub async fn semantic_search_filtered(
        &self,
        query: &str,
        limit: usize,
        types: Option<&[EntityType]>,
    ) -> Result<Vec<Entity>> {
        let mut results = self.semantic_search(query, limit).await?;
        if let Some(types) = types {
            results.retain(|e| types.contains(&e.entity_type));
        }
        Ok(results)
    }

    /// Assemble a formatted context block: top-ranked entities for the query
    /// plus entities referenced by the recent history, then the trailing
    /// history messages. Empty when there is nothing to say.
    pub async fn find_relevant_context(&self, query: &str, history: &[Message]) -> Result<String> {
        let ranked = self.semantic_search(query, CONTEXT_SEARCH_LIMIT).await?;

        let mut entities = ranked;
        let mut seen: HashSet<Uuid> = entities.iter().map(|e| e.id).collect();
        for id in entity_ids_from_history(history) {
            if seen.insert(id) {
                if let Some(entity) = self.store.get_by_id(id).await? {
                    entities.push(entity);
                }
            }
        }

        Ok(format_context(&entities, history))
    }
}

/// Canonical text rendering used for embedding computation.
fn entity_text(entity: &Entity) -> String {
    let observations = entity
        .observations
        .iter()
        .map(|o| o.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{} ({}): {}. {}",
        entity.name, entity.entity_type, entity.attributes.description, observations
    )
}

/// Deduplicated entity ids referenced by history messages, oldest first.
fn entity_ids_from_history(history: &[Message]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    history
        .iter()
        .flat_map(|m| m.entities_mentioned.iter().copied())
        .filter(|id| seen.insert(*id))
        .collect()
}

fn format_context(entities: &[Entity], history: &[Message]) -> String {
    if entities.is_empty() && history.is_empty() {
        return String::new();
    }

    let mut context = String::from("# Relevant Context\n\n");

    if !entities.is_empty() {
        context.push_str("## Entities:\n");
        for entity in entities {
            context.push_str(&format!(
                "- **{}** ({}): {}\n",
                entity.name, entity.entity_type, entity.attributes.description
            ));

            let mut recent: Vec<_> = entity.observations.iter().collect();
            recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            for obs in recent.iter().take(OBSERVATIONS_PER_ENTITY) {
                context.push_str(&format!("  - {}\n", obs.content));
            }
        }
    }

    if !history.is_empty() {
        context.push_str("\n## Recent Conversation:\n");
        let tail_start = history.len().saturating_sub(HISTORY_TAIL);
        for message in &history[tail_start..] {
            let preview: String = message.content.chars().take(MESSAGE_PREVIEW_CHARS).collect();
            context.push_str(&format!("- {}: {}...\n", message.role, preview));
        }
    }

    context
}
