//! Configuration management for Engram-Memory
//!
//! All configurable parameters in one place with environment variable
//! overrides. Sensible defaults for development, configurable in production.

use std::env;
use tracing::info;

/// Embedding service adapter configuration.
///
/// When `endpoint` is unset the server falls back to a deterministic local
/// embedder (see `embedder::FallbackEmbedder`) so it keeps working offline.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible embeddings endpoint, e.g.
    /// `https://api.openai.com/v1/embeddings`
    pub endpoint: Option<String>,

    /// Bearer token sent to the embedding service
    pub api_key: Option<String>,

    /// Model name forwarded to the service
    pub model: String,

    /// Vector dimensionality used by the fallback embedder
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            dimension: 384,
        }
    }
}

/// Entity extraction configuration.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Short functional words rejected as entity names. Language-agnostic:
    /// override via `ENGRAM_STOPLIST` (comma-separated) for other locales.
    pub stoplist: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            stoplist: default_stoplist(),
        }
    }
}

/// Default exclude-list: English functional words plus the French forms the
/// capitalized-word tagger most often misfires on.
fn default_stoplist() -> Vec<String> {
    [
        // Articles, pronouns, auxiliaries
        "the", "a", "an", "this", "that", "these", "those", "i", "we", "you", "he", "she", "it",
        "they", "is", "are", "was", "were", "have", "has", "had", "will", "would", "and", "but",
        "with", "from", "for", "not", // Question words
        "if", "when", "where", "what", "why", "how", // French functional words
        "ont", "est", "sont", "avec", "dans", "pour", "sur",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Server configuration loaded from environment with defaults
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address (default: 127.0.0.1)
    /// Set to 0.0.0.0 for Docker or network-accessible deployments
    pub host: String,

    /// Server port (default: 3040)
    pub port: u16,

    /// Request timeout in seconds (default: 60)
    pub request_timeout_secs: u64,

    /// Maximum concurrent requests (default: 200)
    pub max_concurrent_requests: usize,

    /// Allowed CORS origins (empty = allow all)
    pub cors_allowed_origins: Vec<String>,

    /// Whether running in production mode
    pub is_production: bool,

    pub embedding: EmbeddingConfig,

    pub extraction: ExtractionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3040,
            request_timeout_secs: 60,
            max_concurrent_requests: 200,
            cors_allowed_origins: Vec::new(),
            is_production: false,
            embedding: EmbeddingConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults
    #[allow(clippy::field_reassign_with_default)] // Environment overrides require mutable config
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.is_production = env::var("ENGRAM_ENV")
            .map(|v| {
                let v = v.to_lowercase();
                v == "production" || v == "prod"
            })
            .unwrap_or(false);

        if let Ok(val) = env::var("ENGRAM_HOST") {
            config.host = val;
        }

        if let Ok(val) = env::var("ENGRAM_PORT") {
            if let Ok(port) = val.parse() {
                config.port = port;
            }
        }

        if let Ok(val) = env::var("ENGRAM_REQUEST_TIMEOUT") {
            if let Ok(n) = val.parse() {
                config.request_timeout_secs = n;
            }
        }

        if let Ok(val) = env::var("ENGRAM_MAX_CONCURRENT") {
            if let Ok(n) = val.parse() {
                config.max_concurrent_requests = n;
            }
        }

        if let Ok(origins) = env::var("ENGRAM_CORS_ORIGINS") {
            config.cors_allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if config.is_production && config.cors_allowed_origins.is_empty() {
            tracing::warn!(
                "PRODUCTION WARNING: CORS allows all origins. Set ENGRAM_CORS_ORIGINS for security."
            );
        }

        if let Ok(val) = env::var("ENGRAM_EMBEDDING_URL") {
            if !val.trim().is_empty() {
                config.embedding.endpoint = Some(val);
            }
        }

        if let Ok(val) = env::var("ENGRAM_EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(val);
        } else if let Ok(val) = env::var("OPENAI_API_KEY") {
            config.embedding.api_key = Some(val);
        }

        if let Ok(val) = env::var("ENGRAM_EMBEDDING_MODEL") {
            config.embedding.model = val;
        }

        if let Ok(val) = env::var("ENGRAM_EMBEDDING_DIM") {
            if let Ok(n) = val.parse::<usize>() {
                config.embedding.dimension = n.clamp(8, 4096);
            }
        }

        if let Ok(words) = env::var("ENGRAM_STOPLIST") {
            let stoplist: Vec<String> = words
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !stoplist.is_empty() {
                config.extraction.stoplist = stoplist;
            }
        }

        config
    }

    /// Log the current configuration
    pub fn log(&self) {
        info!("Configuration:");
        info!(
            "   Mode: {}",
            if self.is_production {
                "PRODUCTION"
            } else {
                "Development"
            }
        );
        info!("   Bind: {}:{}", self.host, self.port);
        info!("   Request timeout: {}s", self.request_timeout_secs);
        info!("   Max concurrent: {}", self.max_concurrent_requests);
        if self.cors_allowed_origins.is_empty() {
            info!("   CORS: Permissive (all origins allowed)");
        } else {
            info!("   CORS origins: {:?}", self.cors_allowed_origins);
        }
        match &self.embedding.endpoint {
            Some(url) => info!(
                "   Embeddings: {} (model: {})",
                url, self.embedding.model
            ),
            None => info!(
                "   Embeddings: local fallback ({} dims)",
                self.embedding.dimension
            ),
        }
        info!("   Stoplist: {} words", self.extraction.stoplist.len());
    }
}

/// Environment variable documentation
#[allow(unused)] // Public API - available for CLI help output
pub fn print_env_help() {
    println!("Engram-Memory Configuration Environment Variables:");
    println!();
    println!("  ENGRAM_ENV               - Set to 'production' or 'prod' for production mode");
    println!("  ENGRAM_HOST              - Bind address (default: 127.0.0.1)");
    println!("  ENGRAM_PORT              - Server port (default: 3040)");
    println!("  ENGRAM_REQUEST_TIMEOUT   - Request timeout in seconds (default: 60)");
    println!("  ENGRAM_MAX_CONCURRENT    - Max concurrent requests (default: 200)");
    println!("  ENGRAM_CORS_ORIGINS      - Comma-separated allowed origins (default: all)");
    println!("  ENGRAM_EMBEDDING_URL     - OpenAI-compatible embeddings endpoint");
    println!("  ENGRAM_EMBEDDING_API_KEY - Bearer token (falls back to OPENAI_API_KEY)");
    println!("  ENGRAM_EMBEDDING_MODEL   - Model name (default: text-embedding-3-small)");
    println!("  ENGRAM_EMBEDDING_DIM     - Fallback embedder dimensions (default: 384)");
    println!("  ENGRAM_STOPLIST          - Comma-separated extraction exclude-list");
    println!();
    println!("  RUST_LOG                 - Log level (e.g., info, debug, trace)");
    println!();
}
