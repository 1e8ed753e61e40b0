use crate::config::llm_provider::LlmProvider;

/// Configuration for one model endpoint.
///
/// `temperature` and `max_tokens` act as defaults; chat calls may override
/// them per request.
///
/// # Examples
///
/// ```
/// use llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::OpenAI,
///     model: "llama-3.1-8b-instant".to_string(),
///     endpoint: "https://api.groq.com/openai".to_string(),
///     api_key: Some("gsk_...".to_string()),
///     max_tokens: Some(400),
///     temperature: Some(0.2),
///     top_p: None,
///     timeout_secs: Some(60),
/// };
/// assert_eq!(cfg.provider, LlmProvider::OpenAI);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// Backend kind.
    pub provider: LlmProvider,

    /// Model identifier (e.g. `"llama-3.1-8b-instant"`, `"all-minilm"`).
    pub model: String,

    /// Base URL of the API, without the `/v1/...` or `/api/...` suffix.
    pub endpoint: String,

    /// Bearer token for providers that require one.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}
