//! Health checks for the chat and embedding providers.
//!
//! - Ollama: `GET {endpoint}/api/tags` (best-effort model existence check)
//! - OpenAI-compatible: `GET {endpoint}/v1/models` with Bearer auth
//!
//! [`HealthService::check`] never fails; errors map to `ok = false`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{
    HttpError, LlmServiceError, Provider, ProviderError, ProviderErrorKind, make_snippet,
};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: Option<String>,
    pub ok: bool,
    pub latency_ms: u128,
    /// Short human-readable detail.
    pub message: String,
}

impl HealthStatus {
    fn new(
        cfg: &LlmModelConfig,
        ok: bool,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker reusing a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// # Errors
    /// [`LlmServiceError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, LlmServiceError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks one provider. Failures become `ok = false`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            warn!(provider = ?cfg.provider, endpoint = %cfg.endpoint, "invalid endpoint");
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.check_ollama(cfg).await,
            LlmProvider::OpenAI => self.check_openai(cfg).await,
        };
        let latency = start.elapsed().as_millis();

        match result {
            Ok((ok, message)) => {
                info!(provider = ?cfg.provider, model = %cfg.model, ok, latency_ms = latency, "health check completed");
                HealthStatus::new(cfg, ok, latency, message)
            }
            Err(err) => {
                warn!(provider = ?cfg.provider, model = %cfg.model, latency_ms = latency, error = %err, "health check failed");
                HealthStatus::new(cfg, false, latency, err.to_string())
            }
        }
    }

    fn timeout(&self, cfg: &LlmModelConfig) -> Duration {
        cfg.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
            .min(self.default_timeout)
    }

    async fn check_ollama(&self, cfg: &LlmModelConfig) -> Result<(bool, String), LlmServiceError> {
        let url = format!("{}/api/tags", cfg.endpoint.trim_end_matches('/'));
        debug!(model = %cfg.model, "GET {}", url);

        let resp = self.client.get(&url).timeout(self.timeout(cfg)).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet: make_snippet(&text),
                }),
            )
            .into());
        }

        #[derive(Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        Ok(match resp.json::<Tags>().await {
            Ok(Tags { models: Some(models) }) => {
                if models.iter().any(|m| ollama_name_matches(&m.name, &cfg.model)) {
                    (true, "Ollama is healthy; model is available".into())
                } else {
                    (false, "Ollama is up, but model not found in /api/tags".into())
                }
            }
            Ok(Tags { models: None }) => (true, "Ollama is reachable".into()),
            Err(e) => (true, format!("Ollama is reachable; failed to decode /api/tags: {e}")),
        })
    }

    async fn check_openai(&self, cfg: &LlmModelConfig) -> Result<(bool, String), LlmServiceError> {
        let url = format!("{}/v1/models", cfg.endpoint.trim_end_matches('/'));
        let api_key = cfg.api_key.as_ref().ok_or_else(|| {
            ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey)
        })?;
        let auth = header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;

        debug!(model = %cfg.model, "GET {}", url);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout(cfg))
            .header(header::AUTHORIZATION, auth)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet: make_snippet(&text),
                }),
            )
            .into());
        }

        #[derive(Deserialize)]
        struct ModelItem {
            id: String,
        }
        #[derive(Deserialize)]
        struct Models {
            data: Vec<ModelItem>,
        }

        Ok(match resp.json::<Models>().await {
            Ok(models) if models.data.iter().any(|m| m.id == cfg.model) => {
                (true, "chat API is healthy; model is available".into())
            }
            Ok(_) => (false, "chat API is up, but model not found in /v1/models".into()),
            Err(e) => (true, format!("chat API is reachable; failed to decode /v1/models: {e}")),
        })
    }
}

/// Ollama lists models with a tag (`all-minilm:latest`); configs often omit it.
fn ollama_name_matches(listed: &str, wanted: &str) -> bool {
    listed == wanted
        || listed
            .strip_prefix(wanted)
            .is_some_and(|rest| rest.starts_with(':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_suffix_is_optional() {
        assert!(ollama_name_matches("all-minilm:latest", "all-minilm"));
        assert!(ollama_name_matches("all-minilm:latest", "all-minilm:latest"));
        assert!(!ollama_name_matches("all-minilm-l12:latest", "all-minilm"));
    }

    #[tokio::test]
    async fn invalid_endpoint_reports_not_ok() {
        let svc = HealthService::new(Some(1)).unwrap();
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "all-minilm".into(),
            endpoint: "localhost".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        };
        let status = svc.check(&cfg).await;
        assert!(!status.ok);
        assert_eq!(status.latency_ms, 0);
    }
}
