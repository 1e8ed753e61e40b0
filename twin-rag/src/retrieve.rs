//! Retrieval: embed the question, query the store, keep rank order.

use std::sync::Arc;

use tracing::{debug, info};
use vector_store::{Embedder, FailureKind, Hit, VectorStoreGateway};

/// Embedder plus gateway. Never fails; degraded paths yield no hits.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<Embedder>,
    gateway: Arc<VectorStoreGateway>,
}

impl Retriever {
    pub fn new(embedder: Arc<Embedder>, gateway: Arc<VectorStoreGateway>) -> Self {
        Self { embedder, gateway }
    }

    pub fn embedder(&self) -> &Arc<Embedder> {
        &self.embedder
    }

    pub fn gateway(&self) -> &Arc<VectorStoreGateway> {
        &self.gateway
    }

    /// Returns up to `top_k` hits for `question` in store rank order.
    ///
    /// A blank question returns `[]` without embedding. An embedding failure
    /// is reported to the gateway's sink and also returns `[]`.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Vec<Hit> {
        let question = question.trim();
        if question.is_empty() {
            debug!("blank question; skipping retrieval");
            return Vec::new();
        }

        let vector = match self.embedder.embed(question).await {
            Ok(v) => v,
            Err(e) => {
                self.gateway
                    .sink()
                    .report(FailureKind::Embedding, &e.to_string());
                return Vec::new();
            }
        };

        let hits = self.gateway.query(&vector, top_k).await;
        info!(count = hits.len(), top_k, "retrieved context");
        for hit in &hits {
            info!(
                title = %hit.title(),
                score = hit.score.map(f64::from).unwrap_or(f64::NAN),
                "context hit"
            );
        }
        hits
    }
}
