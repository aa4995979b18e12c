//! End-to-end tests for the memory graph: extraction through storage,
//! conversation threading, and reference resolution.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use engram_memory::embedder::{Embedder, FallbackEmbedder};
use engram_memory::extractor::EntityExtractor;
use engram_memory::graph::MemoryGraph;
use engram_memory::rag::RetrievalEngine;
use engram_memory::store::{ConversationStore, EntityStore, InMemoryStore, merge_upsert};
use engram_memory::types::{
    Conversation, Entity, EntityAttributes, EntityType, Message, MessageRole,
};

fn build_graph() -> (Arc<InMemoryStore>, MemoryGraph) {
    let store = Arc::new(InMemoryStore::new());
    let entities: Arc<dyn EntityStore> = store.clone();
    let conversations: Arc<dyn ConversationStore> = store.clone();
    let embedder: Arc<dyn Embedder> = Arc::new(FallbackEmbedder::new(64));
    let rag = Arc::new(RetrievalEngine::new(entities.clone(), embedder));
    let graph = MemoryGraph::new(entities, conversations, rag, EntityExtractor::default());
    (store, graph)
}

fn concept(name: &str) -> Entity {
    let now = Utc::now();
    Entity {
        id: Uuid::new_v4(),
        name: name.to_string(),
        entity_type: EntityType::Concept,
        aliases: Vec::new(),
        attributes: EntityAttributes {
            description: String::new(),
            confidence: 1.0,
            source: "test".to_string(),
            verified: false,
        },
        observations: Vec::new(),
        embedding: None,
        last_mentioned: now,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// PROCESS MESSAGE
// =============================================================================

#[tokio::test]
async fn test_process_message_extracts_and_stores_entities() {
    let (store, graph) = build_graph();

    let processed = graph
        .process_message(
            "I'm working with Claude from Anthropic",
            MessageRole::User,
            "alice",
            Vec::new(),
        )
        .await
        .unwrap();

    let names: Vec<&str> = processed.entities.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"Claude"));
    assert!(names.contains(&"Anthropic"));

    let stored = store
        .find_by_name("Claude", EntityType::Tool)
        .await
        .unwrap()
        .expect("Claude persisted");
    assert!(
        stored.embedding.is_some(),
        "stored entities carry an embedding"
    );
}

#[tokio::test]
async fn test_repeated_mentions_merge_into_one_entity() {
    let (store, graph) = build_graph();

    let first = graph
        .process_message("Docker keeps crashing", MessageRole::User, "alice", vec![])
        .await
        .unwrap();
    let second = graph
        .process_message(
            "Docker is fixed after the restart",
            MessageRole::User,
            "alice",
            vec![],
        )
        .await
        .unwrap();

    assert_eq!(first.entities[0].id, second.entities[0].id);

    let docker = store
        .find_by_name("Docker", EntityType::Tool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(docker.observations.len(), 2, "one observation per mention");
    assert_eq!(store.entity_count(), 1);
}

// =============================================================================
// CONVERSATION THREADING
// =============================================================================

#[tokio::test]
async fn test_same_day_messages_share_a_conversation() {
    let (store, graph) = build_graph();

    graph
        .process_message("Deploying Docker today", MessageRole::User, "alice", vec![])
        .await
        .unwrap();
    graph
        .process_message(
            "Docker and Kubernetes are both running",
            MessageRole::Assistant,
            "alice",
            vec![],
        )
        .await
        .unwrap();

    let history = store.get_history("alice", 10).await.unwrap();
    assert_eq!(history.len(), 1, "same day appends, never forks");
    assert_eq!(history[0].messages.len(), 2);
    assert!(history[0].context_summary.contains("2 messages"));
    assert!(history[0].topics.contains(&"Docker".to_string()));
}

#[tokio::test]
async fn test_day_boundary_starts_a_new_conversation() {
    let (store, graph) = build_graph();

    // Seed yesterday's conversation directly.
    let message = Message {
        id: Uuid::new_v4(),
        role: MessageRole::User,
        content: "old news".to_string(),
        tools_used: Vec::new(),
        entities_mentioned: Vec::new(),
        timestamp: Utc::now() - Duration::days(1),
    };
    let mut yesterday = Conversation::start("alice", message);
    yesterday.timestamp = Utc::now() - Duration::days(1);
    store.append_or_create(&yesterday).await.unwrap();

    graph
        .process_message("Fresh start with Docker", MessageRole::User, "alice", vec![])
        .await
        .unwrap();

    let history = store.get_history("alice", 10).await.unwrap();
    assert_eq!(history.len(), 2, "a new day opens a new conversation");
    assert_eq!(history[0].messages.len(), 1);
    assert_eq!(history[1].id, yesterday.id);
}

#[tokio::test]
async fn test_conversations_are_scoped_per_user() {
    let (store, graph) = build_graph();

    graph
        .process_message("Docker for alice", MessageRole::User, "alice", vec![])
        .await
        .unwrap();
    graph
        .process_message("Docker for bob", MessageRole::User, "bob", vec![])
        .await
        .unwrap();

    assert_eq!(store.get_history("alice", 10).await.unwrap().len(), 1);
    assert_eq!(store.get_history("bob", 10).await.unwrap().len(), 1);
    assert_eq!(store.conversation_count(), 2);
}

// =============================================================================
// REFERENCE RESOLUTION
// =============================================================================

#[tokio::test]
async fn test_resolve_it_prefers_tools_in_recent_context() {
    let (_, graph) = build_graph();

    graph
        .process_message("I am using Docker daily", MessageRole::User, "alice", vec![])
        .await
        .unwrap();
    graph
        .process_message("I saw Anthropic yesterday", MessageRole::User, "alice", vec![])
        .await
        .unwrap();

    let context = vec![
        "I am using Docker daily".to_string(),
        "I saw Anthropic yesterday".to_string(),
    ];
    let resolved = graph
        .resolve_entity_reference("it", &context)
        .await
        .unwrap()
        .expect("'it' resolves to a tool");
    assert_eq!(resolved.name, "Docker");
    assert_eq!(resolved.entity_type, EntityType::Tool);
}

#[tokio::test]
async fn test_resolve_they_finds_company() {
    let (_, graph) = build_graph();

    graph
        .process_message("Anthropic shipped a release", MessageRole::User, "alice", vec![])
        .await
        .unwrap();

    let context = vec!["Anthropic shipped a release".to_string()];
    let resolved = graph
        .resolve_entity_reference("they", &context)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.entity_type, EntityType::Company);
}

#[tokio::test]
async fn test_resolve_falls_back_to_concept_lookup() {
    let (store, graph) = build_graph();
    merge_upsert(store.as_ref() as &dyn EntityStore, concept("microservices"))
        .await
        .unwrap();

    let resolved = graph
        .resolve_entity_reference("microservices", &[])
        .await
        .unwrap();
    assert_eq!(resolved.map(|e| e.name), Some("microservices".to_string()));
}

#[tokio::test]
async fn test_unresolvable_reference_is_none_not_error() {
    let (_, graph) = build_graph();

    let resolved = graph.resolve_entity_reference("he", &[]).await.unwrap();
    assert!(resolved.is_none());

    let unknown = graph
        .resolve_entity_reference("nonexistent thing", &[])
        .await
        .unwrap();
    assert!(unknown.is_none());
}

// =============================================================================
// CONVERSATION ANALYSIS
// =============================================================================

#[tokio::test]
async fn test_analyze_aggregates_history() {
    let (_, graph) = build_graph();

    graph
        .process_message("We migrated to Kubernetes", MessageRole::User, "alice", vec![])
        .await
        .unwrap();
    graph
        .process_message(
            "Kubernetes rollout looks stable",
            MessageRole::Assistant,
            "alice",
            vec![],
        )
        .await
        .unwrap();

    let analysis = graph.analyze_conversations("alice", 7).await.unwrap();
    assert_eq!(analysis.period_days, 7);
    assert_eq!(analysis.total_conversations, 1);
    assert_eq!(analysis.total_messages, 2);
    assert!(analysis.unique_entities >= 1);
    assert!(analysis.top_topics.contains(&"Kubernetes".to_string()));
    assert!((analysis.average_messages_per_conversation - 2.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_analyze_empty_history_is_zeroed() {
    let (_, graph) = build_graph();

    let analysis = graph.analyze_conversations("nobody", 7).await.unwrap();
    assert_eq!(analysis.total_conversations, 0);
    assert_eq!(analysis.total_messages, 0);
    assert_eq!(analysis.unique_entities, 0);
    assert!(analysis.top_topics.is_empty());
    assert_eq!(analysis.average_messages_per_conversation, 0.0);
}
