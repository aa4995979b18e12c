//! Storage adapter traits and the in-memory reference implementation.
//!
//! Durability belongs to the adapters; the engine never caches entities
//! beyond a single operation. [`merge_upsert`] is the one shared write path
//! that enforces the `(type, normalized name)` uniqueness key.
//!
//! # Known consistency gap
//!
//! `merge_upsert` is a read-then-write sequence (lookup by name/type, then
//! create-or-replace) and is not atomic: two concurrent extractions of the
//! same new entity name can both observe "not found" and both create a
//! record. Closing the race requires a conditional-write primitive at the
//! store boundary, which the trait deliberately does not assume.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::errors::Result;
use crate::types::{Conversation, Entity, EntityType, Message};

/// One conversation's worth of mentions of an entity, for timeline queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub context_summary: String,
    pub messages: Vec<Message>,
}

/// Lookup and persistence over the entity collection.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Exact name or alias match (case-insensitive), scoped to `entity_type`.
    async fn find_by_name(&self, name: &str, entity_type: EntityType) -> Result<Option<Entity>>;

    /// Create if the id is new, replace if it exists.
    async fn upsert(&self, entity: &Entity) -> Result<()>;

    /// Substring match over name, aliases, and observation content, ordered
    /// by `last_mentioned` descending.
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Entity>>;

    /// Full scan, ordered by `last_mentioned` descending.
    async fn get_all(&self) -> Result<Vec<Entity>>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Entity>>;
}

/// Persistence over conversation records.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create or replace the conversation record by id.
    async fn append_or_create(&self, conversation: &Conversation) -> Result<()>;

    /// Most recent conversations for `user_id`, ordered by `timestamp`
    /// descending.
    async fn get_history(&self, user_id: &str, limit: usize) -> Result<Vec<Conversation>>;

    /// Conversations whose messages reference `entity_id`, newest first.
    async fn get_timeline(&self, entity_id: Uuid) -> Result<Vec<TimelineEntry>>;
}

/// Merge-aware entity write: the single path that keeps the
/// `(type, lowercase name-or-alias)` key unique.
///
/// On a key hit the existing id and `created_at` survive, aliases union, and
/// incoming observations append after the existing list (skipping observation
/// ids already present, so re-merging the same entity is idempotent).
/// `updated_at` and `last_mentioned` advance. On a miss a fresh id and
/// `created_at` are assigned.
///
/// Not atomic; see the module-level consistency note.
pub async fn merge_upsert(store: &dyn EntityStore, entity: Entity) -> Result<Entity> {
    let now = Utc::now();

    match store.find_by_name(&entity.name, entity.entity_type).await? {
        Some(existing) => {
            let mut merged = entity;
            merged.id = existing.id;
            merged.created_at = existing.created_at;

            let known: HashSet<Uuid> = existing.observations.iter().map(|o| o.id).collect();
            let mut observations = existing.observations;
            observations.extend(
                merged
                    .observations
                    .into_iter()
                    .filter(|o| !known.contains(&o.id)),
            );
            merged.observations = observations;

            for alias in existing.aliases {
                if !merged.aliases.iter().any(|a| a.eq_ignore_ascii_case(&alias)) {
                    merged.aliases.push(alias);
                }
            }

            // A merge without a recomputed embedding keeps the stored one
            if merged.embedding.is_none() {
                merged.embedding = existing.embedding;
            }

            merged.updated_at = now;
            merged.last_mentioned = now;
            store.upsert(&merged).await?;
            Ok(merged)
        }
        None => {
            let mut fresh = entity;
            fresh.id = Uuid::new_v4();
            fresh.created_at = now;
            fresh.updated_at = now;
            fresh.last_mentioned = now;
            store.upsert(&fresh).await?;
            Ok(fresh)
        }
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// In-memory document store backing both adapter traits.
///
/// Safe for concurrent access (DashMap); used by the server by default and by
/// the test suite. Swap in a real document store by implementing the traits.
#[derive(Default)]
pub struct InMemoryStore {
    entities: DashMap<Uuid, Entity>,
    conversations: DashMap<Uuid, Conversation>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }

    pub fn message_count(&self) -> usize {
        self.conversations
            .iter()
            .map(|c| c.messages.len())
            .sum()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn find_by_name(&self, name: &str, entity_type: EntityType) -> Result<Option<Entity>> {
        Ok(self
            .entities
            .iter()
            .find(|e| e.entity_type == entity_type && e.matches_name(name))
            .map(|e| e.clone()))
    }

    async fn upsert(&self, entity: &Entity) -> Result<()> {
        self.entities.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Entity>> {
        let needle = term.to_lowercase();
        let mut matches: Vec<Entity> = self
            .entities
            .iter()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle)
                    || e.aliases.iter().any(|a| a.to_lowercase().contains(&needle))
                    || e.observations
                        .iter()
                        .any(|o| o.content.to_lowercase().contains(&needle))
            })
            .map(|e| e.clone())
            .collect();

        matches.sort_by(|a, b| b.last_mentioned.cmp(&a.last_mentioned));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn get_all(&self) -> Result<Vec<Entity>> {
        let mut all: Vec<Entity> = self.entities.iter().map(|e| e.clone()).collect();
        all.sort_by(|a, b| b.last_mentioned.cmp(&a.last_mentioned));
        Ok(all)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Entity>> {
        Ok(self.entities.get(&id).map(|e| e.clone()))
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn append_or_create(&self, conversation: &Conversation) -> Result<()> {
        self.conversations
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn get_history(&self, user_id: &str, limit: usize) -> Result<Vec<Conversation>> {
        let mut history: Vec<Conversation> = self
            .conversations
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.clone())
            .collect();

        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        history.truncate(limit);
        Ok(history)
    }

    async fn get_timeline(&self, entity_id: Uuid) -> Result<Vec<TimelineEntry>> {
        let mut entries: Vec<TimelineEntry> = self
            .conversations
            .iter()
            .filter(|c| {
                c.messages
                    .iter()
                    .any(|m| m.entities_mentioned.contains(&entity_id))
            })
            .map(|c| TimelineEntry {
                timestamp: c.timestamp,
                context_summary: c.context_summary.clone(),
                messages: c
                    .messages
                    .iter()
                    .filter(|m| m.entities_mentioned.contains(&entity_id))
                    .cloned()
                    .collect(),
            })
            .collect();

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::EntityExtractor;

    fn sample_entity(name: &str) -> Entity {
        EntityExtractor::default()
            .extract(&format!("Working with {name} today"), "test")
            .into_iter()
            .find(|e| e.name == name)
            .expect("extraction produced the sample entity")
    }

    #[tokio::test]
    async fn test_merge_upsert_creates_then_merges() {
        let store = InMemoryStore::new();

        let first = merge_upsert(&store, sample_entity("Docker")).await.unwrap();
        assert_eq!(store.entity_count(), 1);
        assert_eq!(first.observations.len(), 1);

        let second = merge_upsert(&store, sample_entity("Docker")).await.unwrap();
        assert_eq!(store.entity_count(), 1, "same key must not duplicate");
        assert_eq!(second.id, first.id, "id is stable across merges");
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.observations.len(), 2);
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_merge_upsert_is_idempotent_per_observation() {
        let store = InMemoryStore::new();
        let entity = sample_entity("Docker");

        let merged = merge_upsert(&store, entity.clone()).await.unwrap();
        let remerged = merge_upsert(&store, merged.clone()).await.unwrap();
        assert_eq!(
            remerged.observations.len(),
            merged.observations.len(),
            "re-merging the stored entity must not duplicate observations"
        );
    }

    #[tokio::test]
    async fn test_find_by_name_matches_alias_case_insensitive() {
        let store = InMemoryStore::new();
        let mut entity = sample_entity("Docker");
        entity.aliases.push("docker-engine".to_string());
        let stored = merge_upsert(&store, entity).await.unwrap();

        let by_alias = store
            .find_by_name("DOCKER-ENGINE", EntityType::Tool)
            .await
            .unwrap();
        assert_eq!(by_alias.map(|e| e.id), Some(stored.id));

        let wrong_type = store
            .find_by_name("Docker", EntityType::Person)
            .await
            .unwrap();
        assert!(wrong_type.is_none(), "lookup is scoped to the entity type");
    }

    #[tokio::test]
    async fn test_search_covers_observation_content() {
        let store = InMemoryStore::new();
        merge_upsert(&store, sample_entity("Docker")).await.unwrap();

        let hits = store.search("working with", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Docker");

        let misses = store.search("unrelated phrase", 10).await.unwrap();
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn test_merge_keeps_stored_embedding() {
        let store = InMemoryStore::new();
        let mut entity = sample_entity("Docker");
        entity.embedding = Some(vec![0.1, 0.2]);
        merge_upsert(&store, entity).await.unwrap();

        let merged = merge_upsert(&store, sample_entity("Docker")).await.unwrap();
        assert_eq!(merged.embedding, Some(vec![0.1, 0.2]));
    }
}
