//! In-process fakes for the embedding, index and chat seams.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use llm_service::error_handler::{Provider, ProviderError, ProviderErrorKind};
use llm_service::{ChatRequest, LlmServiceError, Role};
use serde_json::{Value, json};
use twin_rag::{
    ChatBackend, ContextAssembler, DEFAULT_PERSONA, GenerationParams, Generator, RagPipeline,
    Retriever,
};
use vector_store::{
    Embedder, EmbeddingModel, FailureKind, FailureSink, IndexInfo, ModelLoader, QueryResponse,
    StoreError, UpsertEntry, VectorIndex, VectorStoreGateway,
};

pub const D: usize = 1536;

/// Deterministic model of a fixed native width.
pub struct FakeModel {
    pub width: usize,
    pub calls: AtomicUsize,
}

impl FakeModel {
    pub fn new(width: usize) -> Arc<Self> {
        Arc::new(Self {
            width,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let seed: u32 = text.bytes().map(u32::from).sum();
        (0..self.width)
            .map(|i| ((seed as usize + i * 31) % 97) as f32 / 97.0 + 0.5)
            .collect()
    }
}

impl EmbeddingModel for FakeModel {
    fn encode<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, StoreError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let v = self.vector(text);
        Box::pin(async move { Ok(v) })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Loader that always fails and counts attempts.
#[derive(Default)]
pub struct BrokenLoader {
    pub attempts: AtomicUsize,
}

impl ModelLoader for BrokenLoader {
    fn load(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn EmbeddingModel>, StoreError>> + Send + '_>>
    {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(StoreError::Backend("model files missing".into())) })
    }
}

/// In-memory index ranking by dot product; answers in the `matches` shape.
#[derive(Default)]
pub struct MemIndex {
    pub entries: Mutex<Vec<UpsertEntry>>,
    pub queries: AtomicUsize,
}

impl VectorIndex for MemIndex {
    fn query_raw<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> BoxFuture<'a, Result<QueryResponse, StoreError>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let mut scored: Vec<(f32, Value)> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| {
                let score: f32 = e.vector.iter().zip(vector).map(|(a, b)| a * b).sum();
                (score, json!({"id": e.id, "score": score, "metadata": e.metadata}))
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let matches = scored.into_iter().take(top_k).map(|(_, v)| v).collect();
        Box::pin(async move { Ok(QueryResponse::Matches(matches)) })
    }

    fn upsert<'a>(&'a self, entries: &'a [UpsertEntry]) -> BoxFuture<'a, Result<usize, StoreError>> {
        Box::pin(async move {
            let mut stored = self.entries.lock().unwrap();
            for e in entries {
                if e.vector.len() != D {
                    return Err(StoreError::VectorSizeMismatch {
                        got: e.vector.len(),
                        want: D,
                    });
                }
                stored.retain(|s| s.id != e.id);
                stored.push(e.clone());
            }
            Ok(entries.len())
        })
    }

    fn reset(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.entries.lock().unwrap().clear();
            Ok(())
        })
    }

    fn info(&self) -> BoxFuture<'_, Result<IndexInfo, StoreError>> {
        Box::pin(async move {
            Ok(IndexInfo {
                dimension: Some(D),
                vector_count: self.entries.lock().unwrap().len() as u64,
            })
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Index that answers every query with one fixed response.
pub struct FixedIndex(pub QueryResponse);

impl VectorIndex for FixedIndex {
    fn query_raw<'a>(
        &'a self,
        _vector: &'a [f32],
        _top_k: usize,
    ) -> BoxFuture<'a, Result<QueryResponse, StoreError>> {
        let response = self.0.clone();
        Box::pin(async move { Ok(response) })
    }

    fn upsert<'a>(&'a self, entries: &'a [UpsertEntry]) -> BoxFuture<'a, Result<usize, StoreError>> {
        Box::pin(async move { Ok(entries.len()) })
    }

    fn reset(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }

    fn info(&self) -> BoxFuture<'_, Result<IndexInfo, StoreError>> {
        Box::pin(async {
            Ok(IndexInfo {
                dimension: Some(D),
                vector_count: 1,
            })
        })
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Echoes the user message back and counts calls.
#[derive(Default)]
pub struct EchoBackend {
    pub calls: AtomicUsize,
}

impl ChatBackend for EchoBackend {
    fn complete<'a>(
        &'a self,
        req: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<String, LlmServiceError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let user = req
            .messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Box::pin(async move { Ok(user) })
    }
}

/// Fails like a rate-limited provider.
pub struct FailingBackend;

impl ChatBackend for FailingBackend {
    fn complete<'a>(
        &'a self,
        _req: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<String, LlmServiceError>> {
        Box::pin(async {
            Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::Decode("rate limit exceeded".into()),
            )
            .into())
        })
    }
}

/// Sink that records reported failure kinds.
#[derive(Default)]
pub struct RecordingSink {
    pub kinds: Mutex<Vec<FailureKind>>,
}

impl FailureSink for RecordingSink {
    fn report(&self, kind: FailureKind, _detail: &str) {
        self.kinds.lock().unwrap().push(kind);
    }
}

pub fn params() -> GenerationParams {
    GenerationParams {
        model: "llama-3.1-8b-instant".into(),
        temperature: 0.2,
        max_tokens: 400,
    }
}

pub fn pipeline(
    embedder: Arc<Embedder>,
    gateway: Arc<VectorStoreGateway>,
    backend: Arc<dyn ChatBackend>,
) -> RagPipeline {
    RagPipeline::new(
        Retriever::new(embedder, gateway),
        ContextAssembler::new(6000),
        Generator::new(backend, params()),
        DEFAULT_PERSONA,
        3,
    )
}
