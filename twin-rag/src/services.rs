//! Process-wide handles built once at startup and shared by reference.
//!
//! A backend that cannot be constructed is replaced by a stand-in whose every
//! call fails, so the remaining backends stay usable.

use std::sync::Arc;

use futures::future::BoxFuture;
use llm_service::health_service::HealthService;
use llm_service::services::ollama_service::OllamaService;
use llm_service::services::open_ai_service::OpenAiService;
use llm_service::{ChatRequest, LlmModelConfig, LlmProvider, LlmServiceError};
use tracing::{info, warn};
use vector_store::embed::ollama::OllamaLoader;
use vector_store::{
    Embedder, IndexInfo, Ingestor, QueryResponse, StoreError, UpsertEntry, VectorIndex,
    VectorStoreGateway,
};

use crate::cfg::{RagSettings, TwinConfig};
use crate::context::ContextAssembler;
use crate::error::TwinError;
use crate::generate::{ChatBackend, GenerationParams, Generator};
use crate::pipeline::RagPipeline;
use crate::retrieve::Retriever;

/// Index used when the store could not be configured.
struct UnavailableIndex(String);

impl UnavailableIndex {
    fn err(&self) -> StoreError {
        StoreError::Backend(format!("vector store unavailable: {}", self.0))
    }
}

impl VectorIndex for UnavailableIndex {
    fn query_raw<'a>(
        &'a self,
        _vector: &'a [f32],
        _top_k: usize,
    ) -> BoxFuture<'a, Result<QueryResponse, StoreError>> {
        Box::pin(async move { Err(self.err()) })
    }

    fn upsert<'a>(&'a self, _entries: &'a [UpsertEntry]) -> BoxFuture<'a, Result<usize, StoreError>> {
        Box::pin(async move { Err(self.err()) })
    }

    fn reset(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move { Err(self.err()) })
    }

    fn info(&self) -> BoxFuture<'_, Result<IndexInfo, StoreError>> {
        Box::pin(async move { Err(self.err()) })
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Chat backend used when the configured one could not be built.
struct UnavailableBackend(String);

impl ChatBackend for UnavailableBackend {
    fn complete<'a>(&'a self, _req: &'a ChatRequest) -> BoxFuture<'a, Result<String, LlmServiceError>> {
        Box::pin(async move { Err(LlmServiceError::Unavailable(self.0.clone())) })
    }
}

/// Outcome of bringing each backend up.
#[derive(Debug)]
pub struct StartupReport {
    pub embedder: Result<String, String>,
    pub store: Result<IndexInfo, String>,
    pub generator: Result<String, String>,
}

impl StartupReport {
    /// True when none of the three backends is usable.
    pub fn all_failed(&self) -> bool {
        self.embedder.is_err() && self.store.is_err() && self.generator.is_err()
    }

    /// One `info!` or `warn!` per backend.
    pub fn log(&self) {
        match &self.embedder {
            Ok(model) => info!(model = %model, "embedder ready"),
            Err(e) => warn!(error = %e, "embedder unavailable"),
        }
        match &self.store {
            Ok(i) => info!(vectors = i.vector_count, dimension = ?i.dimension, "vector store ready"),
            Err(e) => warn!(error = %e, "vector store unavailable"),
        }
        match &self.generator {
            Ok(msg) => info!(detail = %msg, "generator ready"),
            Err(e) => warn!(error = %e, "generator unavailable"),
        }
    }
}

/// Embedder, gateway and generator wired together.
pub struct TwinServices {
    embedder: Arc<Embedder>,
    gateway: Arc<VectorStoreGateway>,
    generator: Generator,
    settings: RagSettings,
    chat_config: Option<LlmModelConfig>,
    build_errors: BuildErrors,
}

#[derive(Default)]
struct BuildErrors {
    store: Option<String>,
    generator: Option<String>,
}

impl TwinServices {
    /// Constructs every handle once. Never fails: a backend that cannot be
    /// built is replaced by a stand-in and recorded for [`Self::startup_check`].
    pub fn from_config(cfg: &TwinConfig) -> Self {
        let dim = cfg.embedding_dim();
        let mut build_errors = BuildErrors::default();

        let embedder = Arc::new(Embedder::new(
            Arc::new(OllamaLoader::new(cfg.embedding.clone())),
            dim,
        ));

        let index: Arc<dyn VectorIndex> = match cfg
            .store
            .clone()
            .and_then(|s| vector_store::open_index(&s).map_err(|e| e.to_string()))
        {
            Ok(index) => index,
            Err(reason) => {
                warn!(error = %reason, "vector store not configured");
                build_errors.store = Some(reason.clone());
                Arc::new(UnavailableIndex(reason))
            }
        };
        let gateway = Arc::new(VectorStoreGateway::new(index, dim));

        let backend = match chat_backend(&cfg.chat) {
            Ok(b) => b,
            Err(e) => {
                let reason = e.to_string();
                warn!(error = %reason, provider = ?cfg.chat.provider, "chat backend not available");
                build_errors.generator = Some(reason.clone());
                Arc::new(UnavailableBackend(reason))
            }
        };
        let generator = Generator::new(backend, GenerationParams::from_config(&cfg.chat));

        Self {
            embedder,
            gateway,
            generator,
            settings: cfg.rag.clone(),
            chat_config: Some(cfg.chat.clone()),
            build_errors,
        }
    }

    /// Wires caller-provided handles.
    pub fn from_parts(
        embedder: Arc<Embedder>,
        gateway: Arc<VectorStoreGateway>,
        generator: Generator,
        settings: RagSettings,
    ) -> Self {
        Self {
            embedder,
            gateway,
            generator,
            settings,
            chat_config: None,
            build_errors: BuildErrors::default(),
        }
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    pub fn embedder(&self) -> &Arc<Embedder> {
        &self.embedder
    }

    pub fn gateway(&self) -> &Arc<VectorStoreGateway> {
        &self.gateway
    }

    pub fn pipeline(&self) -> RagPipeline {
        RagPipeline::new(
            Retriever::new(self.embedder.clone(), self.gateway.clone()),
            ContextAssembler::new(self.settings.max_ctx_chars),
            self.generator.clone(),
            self.settings.persona.clone(),
            self.settings.top_k,
        )
    }

    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(self.embedder.clone(), self.gateway.clone())
    }

    /// Brings each backend up: loads the embedding model, reads index info
    /// and checks the chat endpoint.
    pub async fn startup_check(&self) -> StartupReport {
        let embedder = match self.embedder.model().await {
            Ok(m) => Ok(m.name().to_string()),
            Err(e) => Err(e.to_string()),
        };

        let store = match &self.build_errors.store {
            Some(reason) => Err(reason.clone()),
            None => self.gateway.check_dimension().await.map_err(|e| e.to_string()),
        };

        let generator = match (&self.build_errors.generator, &self.chat_config) {
            (Some(reason), _) => Err(reason.clone()),
            (None, Some(chat)) => check_chat(chat).await,
            (None, None) => Ok(self.generator.params().model.clone()),
        };

        StartupReport {
            embedder,
            store,
            generator,
        }
    }
}

fn chat_backend(cfg: &LlmModelConfig) -> Result<Arc<dyn ChatBackend>, TwinError> {
    let backend: Arc<dyn ChatBackend> = match cfg.provider {
        LlmProvider::OpenAI => Arc::new(OpenAiService::new(cfg.clone())?),
        LlmProvider::Ollama => Arc::new(OllamaService::new(cfg.clone())?),
    };
    Ok(backend)
}

async fn check_chat(cfg: &LlmModelConfig) -> Result<String, String> {
    let health = HealthService::new(cfg.timeout_secs).map_err(|e| e.to_string())?;
    let status = health.check(cfg).await;
    if status.ok {
        Ok(status.message)
    } else {
        Err(status.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_service::config::default_config::DEFAULT_GROQ_MODEL;

    fn groq_without_key() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: DEFAULT_GROQ_MODEL.into(),
            endpoint: "https://api.groq.com/openai".into(),
            api_key: None,
            max_tokens: Some(400),
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn missing_key_and_store_become_stand_ins() {
        let embedding = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "all-minilm".into(),
            endpoint: "http://127.0.0.1:9".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(1),
        };
        let cfg = TwinConfig {
            store: Err("UPSTASH_VECTOR_REST_URL is not set".into()),
            chat: groq_without_key(),
            embedding,
            rag: RagSettings::default(),
        };
        let services = TwinServices::from_config(&cfg);
        assert_eq!(services.gateway().backend_name(), "unavailable");
        assert!(services.build_errors.store.is_some());
        assert!(services.build_errors.generator.is_some());
        assert_eq!(services.pipeline().top_k(), 3);
    }

    #[tokio::test]
    async fn unavailable_backend_fails_generation() {
        let g = Generator::new(
            Arc::new(UnavailableBackend("no key".into())),
            GenerationParams::from_config(&groq_without_key()),
        );
        let prompt = crate::prompt::build(
            "q",
            &crate::context::ContextBlock::from_lines(vec!["x".into()]),
            "p",
        );
        let answer = g.generate(&prompt).await;
        assert!(answer.text().contains("backend unavailable: no key"));
    }

    #[test]
    fn report_all_failed_only_when_every_backend_failed() {
        let mut report = StartupReport {
            embedder: Err("e".into()),
            store: Err("s".into()),
            generator: Err("g".into()),
        };
        assert!(report.all_failed());
        report.generator = Ok("llama".into());
        assert!(!report.all_failed());
    }
}
