//! Generation: one chat call per prompt, failures folded into [`Answer`].

use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use llm_service::services::ollama_service::OllamaService;
use llm_service::services::open_ai_service::OpenAiService;
use llm_service::{ChatRequest, LlmModelConfig, LlmServiceError};
use tracing::{debug, info, warn};

use crate::error::{Answer, TwinError};
use crate::prompt::Prompt;

/// A chat completion backend.
pub trait ChatBackend: Send + Sync {
    /// Returns the generated text for `req`.
    fn complete<'a>(&'a self, req: &'a ChatRequest) -> BoxFuture<'a, Result<String, LlmServiceError>>;
}

impl ChatBackend for OpenAiService {
    fn complete<'a>(&'a self, req: &'a ChatRequest) -> BoxFuture<'a, Result<String, LlmServiceError>> {
        Box::pin(self.chat(req))
    }
}

impl ChatBackend for OllamaService {
    fn complete<'a>(&'a self, req: &'a ChatRequest) -> BoxFuture<'a, Result<String, LlmServiceError>> {
        Box::pin(self.chat(req))
    }
}

/// Model and sampling settings applied to every call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Takes model, temperature and token cap from a chat config.
    pub fn from_config(cfg: &LlmModelConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            temperature: cfg
                .temperature
                .unwrap_or(llm_service::config::default_config::DEFAULT_TEMPERATURE),
            max_tokens: cfg
                .max_tokens
                .unwrap_or(llm_service::config::default_config::DEFAULT_MAX_TOKENS),
        }
    }
}

/// Calls the backend with a two-message prompt.
#[derive(Clone)]
pub struct Generator {
    backend: Arc<dyn ChatBackend>,
    params: GenerationParams,
}

impl Generator {
    pub fn new(backend: Arc<dyn ChatBackend>, params: GenerationParams) -> Self {
        Self { backend, params }
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Generates an answer. Backend failures become [`Answer::Failed`].
    pub async fn generate(&self, prompt: &Prompt) -> Answer {
        match self.try_generate(prompt).await {
            Ok(text) => Answer::Generated(text),
            Err(e) => Answer::Failed(e),
        }
    }

    /// Like [`Generator::generate`] but returns the typed error.
    ///
    /// # Errors
    /// [`TwinError::GenerationError`] for any backend failure.
    pub async fn try_generate(&self, prompt: &Prompt) -> Result<String, TwinError> {
        let req = ChatRequest {
            model: self.params.model.clone(),
            messages: prompt.to_messages(),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };

        let started = Instant::now();
        debug!(model = %req.model, prompt_chars = prompt.user.len(), "generating");

        match self.backend.complete(&req).await {
            Ok(text) => {
                info!(
                    model = %req.model,
                    latency_ms = started.elapsed().as_millis(),
                    answer_chars = text.len(),
                    "generation completed"
                );
                Ok(text.trim().to_string())
            }
            Err(e) => {
                warn!(model = %req.model, error = %e, "generation failed");
                Err(TwinError::GenerationError(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextBlock;
    use crate::prompt::build;
    use llm_service::error_handler::{Provider, ProviderError, ProviderErrorKind};

    struct Fails;

    impl ChatBackend for Fails {
        fn complete<'a>(
            &'a self,
            _req: &'a ChatRequest,
        ) -> BoxFuture<'a, Result<String, LlmServiceError>> {
            Box::pin(async {
                Err(ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey).into())
            })
        }
    }

    struct Padded;

    impl ChatBackend for Padded {
        fn complete<'a>(
            &'a self,
            req: &'a ChatRequest,
        ) -> BoxFuture<'a, Result<String, LlmServiceError>> {
            Box::pin(async move { Ok(format!("  {} @ {}\n", req.model, req.max_tokens)) })
        }
    }

    fn params() -> GenerationParams {
        GenerationParams {
            model: "llama-3.1-8b-instant".into(),
            temperature: 0.2,
            max_tokens: 400,
        }
    }

    fn prompt() -> Prompt {
        build("q", &ContextBlock::from_lines(vec!["a".into()]), "p")
    }

    #[tokio::test]
    async fn backend_error_becomes_marked_answer() {
        let g = Generator::new(Arc::new(Fails), params());
        let answer = g.generate(&prompt()).await;
        assert!(answer.is_failure());
        assert!(answer.text().starts_with(crate::ERROR_MARKER));
        assert!(answer.text().contains("missing API key"));
    }

    #[tokio::test]
    async fn output_is_trimmed_and_params_forwarded() {
        let g = Generator::new(Arc::new(Padded), params());
        let answer = g.try_generate(&prompt()).await.unwrap();
        assert_eq!(answer, "llama-3.1-8b-instant @ 400");
    }
}
