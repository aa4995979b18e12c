//! Shared application state: the wired-up engine behind every handler.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::embedder;
use crate::extractor::EntityExtractor;
use crate::graph::MemoryGraph;
use crate::injector::ContextInjector;
use crate::rag::RetrievalEngine;
use crate::store::{ConversationStore, EntityStore, InMemoryStore};

/// Application state type alias
pub type AppState = Arc<MemoryEngine>;

/// The assembled engine: store, retrieval, graph, and injector sharing one
/// backing store.
pub struct MemoryEngine {
    config: ServerConfig,
    store: Arc<InMemoryStore>,
    rag: Arc<RetrievalEngine>,
    graph: Arc<MemoryGraph>,
    injector: ContextInjector,
}

impl MemoryEngine {
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let entities: Arc<dyn EntityStore> = store.clone();
        let conversations: Arc<dyn ConversationStore> = store.clone();

        let embedder = embedder::from_config(&config.embedding);
        let rag = Arc::new(RetrievalEngine::new(entities.clone(), embedder));
        let graph = Arc::new(MemoryGraph::new(
            entities,
            conversations,
            rag.clone(),
            EntityExtractor::new(&config.extraction),
        ));
        let injector = ContextInjector::new(graph.clone());

        Self {
            config,
            store,
            rag,
            graph,
            injector,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn rag(&self) -> &RetrievalEngine {
        &self.rag
    }

    pub fn graph(&self) -> &MemoryGraph {
        &self.graph
    }

    pub fn injector(&self) -> &ContextInjector {
        &self.injector
    }
}
