//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for vector-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The embedding model failed to load or to encode.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Vector length does not match the index dimension.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Similarity query failed or returned malformed data.
    #[error("query failed: {0}")]
    Query(String),

    /// Ingestion write failed.
    #[error("upsert failed: {0}")]
    Upsert(String),

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from the store.
    #[error("HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: u16,
        url: String,
        snippet: String,
    },

    /// Response payload did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend client errors (Qdrant) wrapped as text.
    #[error("backend error: {0}")]
    Backend(String),
}
