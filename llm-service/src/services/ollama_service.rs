//! Ollama client for native embeddings and local chat.
//!
//! - `POST {endpoint}/api/embeddings`: one embedding per input text
//! - `POST {endpoint}/api/chat`: non-streaming chat completion
//!
//! # Examples
//!
//! ```no_run
//! use llm_service::config::default_config::config_ollama_embedding;
//! use llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = OllamaService::new(config_ollama_embedding()?)?;
//! let vec = svc.embeddings("Ferris is a friendly crab.").await?;
//! println!("native width = {}", vec.len());
//! # Ok(()) }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        HttpError, LlmServiceError, Provider, ProviderError, ProviderErrorKind, Result,
        make_snippet,
    },
    services::{ChatMessage, ChatRequest, completion::CompletionShape},
};

/// Thin client for Ollama.
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`LlmServiceError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(provider_err(ProviderErrorKind::InvalidProvider));
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(provider_err(ProviderErrorKind::InvalidEndpoint(
                cfg.endpoint.clone(),
            )));
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .brotli(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{base}/api/chat");
        let url_embeddings = format!("{base}/api/embeddings");

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embeddings,
        })
    }

    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Retrieves the native embedding for `input`.
    ///
    /// The vector has the model's own width (384 for `all-minilm`); fitting it
    /// to an index dimension is the caller's job.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`LlmServiceError::HttpTransport`] for client errors
    /// - `Decode` if the response cannot be parsed or is empty
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        debug!(input_len = input.len(), "POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let text = resp.text().await.unwrap_or_default();
            return Err(provider_err(ProviderErrorKind::HttpStatus(HttpError {
                status,
                url,
                snippet: make_snippet(&text),
            })));
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            provider_err(ProviderErrorKind::Decode(format!(
                "serde error: {e}; expected `{{ embedding: number[] }}`"
            )))
        })?;

        if out.embedding.is_empty() {
            return Err(provider_err(ProviderErrorKind::Decode(
                "empty embedding returned".into(),
            )));
        }

        Ok(out.embedding)
    }

    /// Performs a **non-streaming** chat request via `/api/chat`.
    ///
    /// # Errors
    /// Same classes as [`OllamaService::embeddings`].
    #[instrument(skip_all, fields(model = %req.model))]
    pub async fn chat(&self, req: &ChatRequest) -> Result<String> {
        let body = ChatBody {
            model: &req.model,
            messages: &req.messages,
            stream: false,
            options: ChatOptions {
                temperature: Some(req.temperature),
                top_p: self.cfg.top_p,
                num_predict: Some(req.max_tokens),
            },
        };

        debug!(messages = req.messages.len(), "POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            return Err(provider_err(ProviderErrorKind::HttpStatus(HttpError {
                status,
                url,
                snippet: make_snippet(&text),
            })));
        }

        let raw: Value = resp.json().await.map_err(|e| {
            provider_err(ProviderErrorKind::Decode(format!(
                "serde error: {e}; ensure `stream=false` is used"
            )))
        })?;

        Ok(CompletionShape::classify(&raw).into_text())
    }
}

fn provider_err(kind: ProviderErrorKind) -> LlmServiceError {
    ProviderError::new(Provider::Ollama, kind).into()
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}
