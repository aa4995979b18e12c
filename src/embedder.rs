//! Embedding service adapter.
//!
//! The engine treats embedding computation as an external collaborator: a
//! network service mapping a string to a fixed-dimension vector. Two
//! implementations:
//! - [`HttpEmbedder`]: OpenAI-compatible `/embeddings` endpoint over reqwest.
//! - [`FallbackEmbedder`]: deterministic local token-hash vectors, used when
//!   no endpoint is configured so the server keeps working offline.
//!
//! Failures are network-class errors (`AppError::EmbeddingError`), never
//! domain errors; no retries happen at this layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::warn;

use crate::config::EmbeddingConfig;
use crate::errors::{AppError, Result};

/// Maps text to a fixed-dimension vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for `text`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimensionality.
    fn dimension(&self) -> usize;
}

/// Build the embedder the configuration asks for.
pub fn from_config(config: &EmbeddingConfig) -> Arc<dyn Embedder> {
    match &config.endpoint {
        Some(endpoint) => Arc::new(HttpEmbedder::new(
            endpoint.clone(),
            config.api_key.clone(),
            config.model.clone(),
            config.dimension,
        )),
        None => {
            warn!(
                "No embedding endpoint configured, using deterministic fallback ({} dims)",
                config.dimension
            );
            Arc::new(FallbackEmbedder::new(config.dimension))
        }
    }
}

// =============================================================================
// HTTP EMBEDDER
// =============================================================================

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible text-embedding endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(endpoint: String, api_key: Option<String>, model: String, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            dimension,
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: [text],
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::EmbeddingError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingError(format!(
                "embedding service returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::EmbeddingError(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                AppError::EmbeddingError("embedding service returned no vectors".to_string())
            })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// =============================================================================
// FALLBACK EMBEDDER
// =============================================================================

/// Deterministic local embedder: hashes lowercase tokens into buckets and
/// L2-normalizes the resulting histogram.
///
/// Not a semantic model. Texts sharing vocabulary score higher than disjoint
/// texts, which is enough for offline operation and for tests; identical text
/// always maps to the identical vector.
pub struct FallbackEmbedder {
    dimension: usize,
}

impl FallbackEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

#[async_trait]
impl Embedder for FallbackEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimension;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
