//! Ollama-backed embedding model.

use std::{future::Future, pin::Pin, sync::Arc};

use llm_service::LlmModelConfig;
use llm_service::services::ollama_service::OllamaService;
use tracing::debug;

use crate::embed::{EmbeddingModel, ModelLoader};
use crate::errors::StoreError;

/// Native embeddings from an Ollama server (`all-minilm` is 384 wide).
pub struct OllamaEmbedder {
    svc: OllamaService,
}

impl EmbeddingModel for OllamaEmbedder {
    fn encode<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            self.svc
                .embeddings(text)
                .await
                .map_err(|e| StoreError::EmbeddingUnavailable(e.to_string()))
        })
    }

    fn name(&self) -> &str {
        self.svc.model()
    }
}

/// Loads an [`OllamaEmbedder`]: builds the client and runs one warm-up
/// embedding so an unreachable server or missing model fails the load.
pub struct OllamaLoader {
    cfg: LlmModelConfig,
}

impl OllamaLoader {
    pub fn new(cfg: LlmModelConfig) -> Self {
        Self { cfg }
    }
}

impl ModelLoader for OllamaLoader {
    fn load(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn EmbeddingModel>, StoreError>> + Send + '_>>
    {
        Box::pin(async move {
            let svc = OllamaService::new(self.cfg.clone())
                .map_err(|e| StoreError::EmbeddingUnavailable(e.to_string()))?;
            let warmup = svc
                .embeddings("warm-up")
                .await
                .map_err(|e| StoreError::EmbeddingUnavailable(e.to_string()))?;
            debug!(model = %self.cfg.model, native_dim = warmup.len(), "ollama embedder ready");
            let model: Arc<dyn EmbeddingModel> = Arc::new(OllamaEmbedder { svc });
            Ok(model)
        })
    }
}
