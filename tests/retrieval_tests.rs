//! Retrieval engine tests: semantic ranking with the deterministic fallback
//! embedder, context assembly, and the injection decision path.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use engram_memory::embedder::{Embedder, FallbackEmbedder};
use engram_memory::extractor::EntityExtractor;
use engram_memory::graph::MemoryGraph;
use engram_memory::injector::ContextInjector;
use engram_memory::rag::RetrievalEngine;
use engram_memory::store::{ConversationStore, EntityStore, InMemoryStore};
use engram_memory::types::{
    Entity, EntityAttributes, EntityType, MessageRole, Observation,
};

fn build_engine() -> (Arc<InMemoryStore>, Arc<RetrievalEngine>) {
    let store = Arc::new(InMemoryStore::new());
    let entities: Arc<dyn EntityStore> = store.clone();
    let embedder: Arc<dyn Embedder> = Arc::new(FallbackEmbedder::new(128));
    (store, Arc::new(RetrievalEngine::new(entities, embedder)))
}

fn entity(name: &str, entity_type: EntityType, observation: &str) -> Entity {
    let now = Utc::now();
    Entity {
        id: Uuid::new_v4(),
        name: name.to_string(),
        entity_type,
        aliases: Vec::new(),
        attributes: EntityAttributes {
            description: format!("Auto-extracted {entity_type}"),
            confidence: 0.8,
            source: "test".to_string(),
            verified: false,
        },
        observations: vec![Observation {
            id: Uuid::new_v4(),
            content: observation.to_string(),
            timestamp: now,
            source: "test".to_string(),
            confidence: 0.8,
            tags: Vec::new(),
        }],
        embedding: None,
        last_mentioned: now,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// SEMANTIC SEARCH
// =============================================================================

#[tokio::test]
async fn test_semantic_search_ranks_by_vocabulary_overlap() {
    let (_, rag) = build_engine();

    rag.add_entity(entity(
        "Docker",
        EntityType::Tool,
        "container runtime for packaging services",
    ))
    .await
    .unwrap();
    rag.add_entity(entity(
        "Quarterly Review",
        EntityType::Event,
        "finance meeting about revenue projections",
    ))
    .await
    .unwrap();

    let results = rag
        .semantic_search("container runtime packaging", 2)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].name, "Docker", "overlapping vocabulary wins");
}

#[tokio::test]
async fn test_semantic_search_respects_limit_and_type_filter() {
    let (_, rag) = build_engine();

    rag.add_entity(entity("Docker", EntityType::Tool, "container runtime"))
        .await
        .unwrap();
    rag.add_entity(entity("Kubernetes", EntityType::Tool, "container orchestrator"))
        .await
        .unwrap();
    rag.add_entity(entity("Anthropic", EntityType::Company, "research company"))
        .await
        .unwrap();

    let limited = rag.semantic_search("container", 1).await.unwrap();
    assert_eq!(limited.len(), 1);

    let companies = rag
        .semantic_search_filtered("research company", 10, Some(&[EntityType::Company]))
        .await
        .unwrap();
    assert!(companies.iter().all(|e| e.entity_type == EntityType::Company));
    assert_eq!(companies.len(), 1);
}

#[tokio::test]
async fn test_search_skips_entities_without_embeddings() {
    let (store, rag) = build_engine();

    // Written directly, bypassing add_entity, so no embedding exists.
    let raw = entity("Ghost", EntityType::Concept, "never embedded");
    store.upsert(&raw).await.unwrap();

    let results = rag.semantic_search("never embedded", 10).await.unwrap();
    assert!(results.is_empty());
}

// =============================================================================
// CONTEXT ASSEMBLY
// =============================================================================

#[tokio::test]
async fn test_find_relevant_context_empty_store_is_empty_string() {
    let (_, rag) = build_engine();
    let context = rag.find_relevant_context("anything", &[]).await.unwrap();
    assert_eq!(context, "");
}

#[tokio::test]
async fn test_find_relevant_context_renders_entities_and_history() {
    let (_, rag) = build_engine();

    rag.add_entity(entity("Docker", EntityType::Tool, "container runtime"))
        .await
        .unwrap();

    let context = rag
        .find_relevant_context("container runtime", &[])
        .await
        .unwrap();
    assert!(context.starts_with("# Relevant Context"));
    assert!(context.contains("- **Docker** (tool):"));
    assert!(context.contains("container runtime"));
}

// =============================================================================
// INJECTION PATH
// =============================================================================

fn build_injector() -> (MemoryGraphHandle, ContextInjector) {
    let store = Arc::new(InMemoryStore::new());
    let entities: Arc<dyn EntityStore> = store.clone();
    let conversations: Arc<dyn ConversationStore> = store.clone();
    let embedder: Arc<dyn Embedder> = Arc::new(FallbackEmbedder::new(128));
    let rag = Arc::new(RetrievalEngine::new(entities.clone(), embedder));
    let graph = Arc::new(MemoryGraph::new(
        entities,
        conversations,
        rag,
        EntityExtractor::default(),
    ));
    (graph.clone(), ContextInjector::new(graph))
}

type MemoryGraphHandle = Arc<MemoryGraph>;

#[tokio::test]
async fn test_inject_passes_through_without_cue() {
    let (_, injector) = build_injector();
    let out = injector.inject("Deploy to staging", "alice").await.unwrap();
    assert_eq!(out, "Deploy to staging");
}

#[tokio::test]
async fn test_inject_prepends_context_on_cue() {
    let (graph, injector) = build_injector();

    graph
        .process_message(
            "Docker is our container runtime",
            MessageRole::User,
            "alice",
            vec![],
        )
        .await
        .unwrap();

    let out = injector
        .inject("What did we decide about Docker?", "alice")
        .await
        .unwrap();
    assert!(out.starts_with("# Relevant Context"));
    assert!(out.contains("\n\n---\n\nUser message: What did we decide about Docker?"));
}

#[tokio::test]
async fn test_inject_with_cue_but_empty_memory_passes_through() {
    let (_, injector) = build_injector();
    let message = "What did the benchmark show?";
    let out = injector.inject(message, "alice").await.unwrap();
    assert_eq!(out, message);
}
