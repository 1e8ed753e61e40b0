//! Embedding contract, vector-store gateway and ingestion for the digital twin.
//!
//! - [`Embedder`] turns text into vectors of exactly `D` values
//! - [`VectorStoreGateway`] queries an index and normalizes its responses
//! - [`Ingestor`] loads a profile document and writes it into the index
//!
//! Two index backends are available: Upstash Vector (REST) and Qdrant.

mod config;
pub mod embed;
mod errors;
mod gateway;
mod ids;
pub mod ingest;
mod qdrant_facade;
mod record;
mod response;
mod upstash;

pub use config::{BackendKind, DEFAULT_EMBEDDING_DIM, StoreConfig};
pub use embed::{Embedder, EmbeddingModel, ModelLoader, fit_dimension};
pub use errors::StoreError;
pub use gateway::{
    DEFAULT_TOP_K, FailureKind, FailureSink, TracingSink, VectorIndex, VectorStoreGateway,
};
pub use ids::stable_uuid;
pub use ingest::{IngestOptions, Ingestor, load_profile};
pub use qdrant_facade::QdrantIndex;
pub use record::{Chunk, Hit, IndexInfo, UpsertEntry, resolve_text};
pub use response::{QueryResponse, ScoredRecord};
pub use upstash::UpstashIndex;

use std::sync::Arc;
use tracing::trace;

/// Builds the index selected by `cfg.backend`.
///
/// # Errors
/// [`StoreError::Config`] when backend settings are missing or invalid.
pub fn open_index(cfg: &StoreConfig) -> Result<Arc<dyn VectorIndex>, StoreError> {
    cfg.validate()?;
    trace!(backend = ?cfg.backend, "open_index");
    match cfg.backend {
        BackendKind::Upstash => {
            let url = cfg.upstash_url.as_deref().unwrap_or_default();
            let token = cfg.upstash_token.as_deref().unwrap_or_default();
            Ok(Arc::new(UpstashIndex::new(url, token)?))
        }
        BackendKind::Qdrant => Ok(Arc::new(QdrantIndex::new(
            &cfg.qdrant_url,
            cfg.qdrant_api_key.as_deref(),
            cfg.collection.clone(),
            cfg.embedding_dim,
        )?)),
    }
}

/// Gateway over [`open_index`] with the default tracing sink.
pub fn connect(cfg: &StoreConfig) -> Result<VectorStoreGateway, StoreError> {
    Ok(VectorStoreGateway::new(open_index(cfg)?, cfg.embedding_dim))
}
