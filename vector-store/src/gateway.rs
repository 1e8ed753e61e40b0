//! Gateway over a remote vector index.
//!
//! Queries never fail from the caller's point of view: a backend error is
//! reported to a [`FailureSink`] and degrades to an empty hit list.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::errors::StoreError;
use crate::record::{Hit, IndexInfo, UpsertEntry};
use crate::response::QueryResponse;

/// Default number of hits requested per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Minimal surface of a vector index backend.
pub trait VectorIndex: Send + Sync {
    /// Runs a similarity query and returns the backend's raw response.
    fn query_raw<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> BoxFuture<'a, Result<QueryResponse, StoreError>>;

    /// Writes entries, returning how many were accepted.
    fn upsert<'a>(&'a self, entries: &'a [UpsertEntry]) -> BoxFuture<'a, Result<usize, StoreError>>;

    /// Removes every vector from the index.
    fn reset(&self) -> BoxFuture<'_, Result<(), StoreError>>;

    fn info(&self) -> BoxFuture<'_, Result<IndexInfo, StoreError>>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Category of a degraded failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Embedding,
    Query,
    Upsert,
    Generation,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding_unavailable",
            Self::Query => "query_error",
            Self::Upsert => "upsert_error",
            Self::Generation => "generation_error",
        }
    }
}

/// Receives failures that were converted into degraded values.
pub trait FailureSink: Send + Sync {
    fn report(&self, kind: FailureKind, detail: &str);
}

/// Default sink: one `warn!` event per failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, kind: FailureKind, detail: &str) {
        warn!(kind = kind.as_str(), detail = %detail, "degraded failure");
    }
}

/// Uniform query/upsert surface over any [`VectorIndex`].
#[derive(Clone)]
pub struct VectorStoreGateway {
    index: Arc<dyn VectorIndex>,
    sink: Arc<dyn FailureSink>,
    dim: usize,
}

impl VectorStoreGateway {
    pub fn new(index: Arc<dyn VectorIndex>, dim: usize) -> Self {
        Self::with_sink(index, Arc::new(TracingSink), dim)
    }

    pub fn with_sink(index: Arc<dyn VectorIndex>, sink: Arc<dyn FailureSink>, dim: usize) -> Self {
        Self { index, sink, dim }
    }

    /// Target dimension `D` the index is expected to have.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn sink(&self) -> &Arc<dyn FailureSink> {
        &self.sink
    }

    pub fn backend_name(&self) -> &'static str {
        self.index.name()
    }

    /// Similarity query. Errors are reported to the sink and yield `[]`.
    ///
    /// `top_k` below 1 is raised to 1. The vector is passed through as is.
    pub async fn query(&self, vector: &[f32], top_k: usize) -> Vec<Hit> {
        match self.try_query(vector, top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                self.sink.report(FailureKind::Query, &e.to_string());
                Vec::new()
            }
        }
    }

    /// Like [`VectorStoreGateway::query`] but surfaces the error.
    pub async fn try_query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Hit>, StoreError> {
        let top_k = top_k.max(1);
        debug!(backend = self.index.name(), top_k, dim = vector.len(), "vector query");
        let raw = self.index.query_raw(vector, top_k).await?;
        if raw.is_empty() {
            debug!(backend = self.index.name(), "no matches");
            return Ok(Vec::new());
        }
        let returned = raw.len();
        let hits = raw.into_hits();
        if hits.len() < returned {
            debug!(returned, kept = hits.len(), "skipped malformed matches");
        }
        debug!(hits = hits.len(), "vector query completed");
        Ok(hits)
    }

    /// Writes entries.
    ///
    /// # Errors
    /// [`StoreError::Upsert`] wrapping the backend failure.
    pub async fn upsert(&self, entries: &[UpsertEntry]) -> Result<usize, StoreError> {
        if entries.is_empty() {
            return Ok(0);
        }
        match self.index.upsert(entries).await {
            Ok(n) => {
                debug!(backend = self.index.name(), count = n, "upsert completed");
                Ok(n)
            }
            Err(e) => {
                let detail = match e {
                    StoreError::Upsert(msg) => msg,
                    other => other.to_string(),
                };
                self.sink.report(FailureKind::Upsert, &detail);
                Err(StoreError::Upsert(detail))
            }
        }
    }

    pub async fn reset(&self) -> Result<(), StoreError> {
        info!(backend = self.index.name(), "resetting index");
        self.index.reset().await
    }

    pub async fn info(&self) -> Result<IndexInfo, StoreError> {
        self.index.info().await
    }

    /// Fetches index info and verifies the index dimension matches `D`.
    ///
    /// An index that does not report its dimension is accepted.
    ///
    /// # Errors
    /// [`StoreError::VectorSizeMismatch`] when the dimensions differ.
    pub async fn check_dimension(&self) -> Result<IndexInfo, StoreError> {
        let info = self.index.info().await?;
        match info.dimension {
            Some(d) if d != self.dim => {
                warn!(
                    backend = self.index.name(),
                    index_dim = d,
                    target_dim = self.dim,
                    "index dimension differs from EMBEDDING_DIM; queries will be rejected"
                );
                Err(StoreError::VectorSizeMismatch {
                    got: d,
                    want: self.dim,
                })
            }
            _ => {
                debug!(backend = self.index.name(), vectors = info.vector_count, "index info");
                Ok(info)
            }
        }
    }
}
