//! Client for OpenAI-compatible chat completion APIs (Groq by default).
//!
//! Endpoint derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions: chat completion (non-streaming)
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use reqwest::header;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::{
    config::{
        default_config::DEFAULT_TIMEOUT_SECS, llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{
        HttpError, LlmServiceError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
    services::{ChatMessage, ChatRequest, completion::CompletionShape},
};

/// Thin client for an OpenAI-compatible chat API.
///
/// Keeps a preconfigured `reqwest::Client` (timeout + bearer header) so
/// repeated calls reuse one connection pool.
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not OpenAI
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`LlmServiceError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmServiceError> {
        if cfg.provider != LlmProvider::OpenAI {
            return Err(
                ProviderError::new(Provider::OpenAI, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout_secs = cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()?;

        let url_chat = format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'));

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs,
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Model configured for this client.
    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Config this client was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** chat completion and returns the trimmed text.
    ///
    /// The response body is decoded as loose JSON and classified by
    /// [`CompletionShape`], so unusual payloads still yield text.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`LlmServiceError::HttpTransport`] for client/network failures
    /// - `Decode` if the body is not JSON
    pub async fn chat(&self, req: &ChatRequest) -> Result<String, LlmServiceError> {
        let started = Instant::now();
        let body = ChatCompletionRequest {
            model: &req.model,
            messages: &req.messages,
            temperature: Some(req.temperature),
            top_p: self.cfg.top_p,
            max_tokens: Some(req.max_tokens),
        };

        debug!(
            model = %req.model,
            messages = req.messages.len(),
            temperature = req.temperature,
            max_tokens = req.max_tokens,
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %req.model,
                latency_ms = started.elapsed().as_millis(),
                "/v1/chat/completions returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let raw: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %req.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode /v1/chat/completions response"
                );
                return Err(ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!("serde error: {e}")),
                )
                .into());
            }
        };

        let shape = CompletionShape::classify(&raw);
        if matches!(shape, CompletionShape::Raw(_)) {
            debug!(model = %req.model, "completion did not match a known shape; using raw JSON");
        }

        info!(
            model = %req.model,
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(shape.into_text())
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}
