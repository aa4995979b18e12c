//! Engram-Memory Library
//!
//! Running conversational memory for AI agents: extracts named entities from
//! incoming text, merges them into a persistent entity graph, threads messages
//! into daily conversations, and retrieves relevant prior context (recency +
//! semantic similarity) for injection into future turns.
//!
//! # Key Features
//! - Rule-based entity extraction with a pluggable stoplist
//! - Merge-aware entity upserts keyed on (type, normalized name)
//! - Daily conversation threading with derived summaries and topics
//! - Cosine-similarity ranking over stored entity embeddings
//! - Heuristic context injection for recall-style user messages
//!
//! Storage and embedding computation live behind adapter traits
//! ([`store::EntityStore`], [`store::ConversationStore`], [`embedder::Embedder`]);
//! the engine itself holds no entity state beyond a single operation's lifetime.

pub mod config;
pub mod embedder;
pub mod errors;
pub mod extractor;
pub mod graph;
pub mod handlers;
pub mod injector;
pub mod rag;
pub mod similarity;
pub mod store;
pub mod types;
pub mod validation;

// Re-export dependencies to ensure tests use the same version
pub use chrono;
pub use uuid;
