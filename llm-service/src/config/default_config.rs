//! Default model configs read from environment variables.
//!
//! Two roles are needed by the digital twin:
//!
//! - **Chat** → OpenAI-compatible completion model (Groq by default)
//! - **Embedding** → native Ollama embedding model
//!
//! Every variable has a default except `GROQ_API_KEY`, which is only
//! checked when the chat client is built. `LLM_PROVIDER=ollama` switches
//! chat to a local Ollama model.

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        ConfigError, Result, env_opt, env_opt_f32, env_opt_u32, env_opt_u64,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 400;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
pub const DEFAULT_OLLAMA_CHAT_MODEL: &str = "llama3.1";

/// Chat config for the provider selected by `LLM_PROVIDER` (default `groq`).
///
/// # Errors
/// [`ConfigError::UnsupportedProvider`] for unknown names, plus whatever the
/// provider-specific constructor reports.
pub fn config_chat() -> Result<LlmModelConfig> {
    let raw = env_opt("LLM_PROVIDER").unwrap_or_else(|| "groq".to_string());
    match LlmProvider::parse(&raw) {
        Some(LlmProvider::OpenAI) => config_groq_chat(),
        Some(LlmProvider::Ollama) => config_ollama_chat(),
        None => Err(ConfigError::UnsupportedProvider(raw).into()),
    }
}

/// Generation parameters shared by every chat provider.
fn generation_params() -> Result<(f32, u32, u64)> {
    let temperature = env_opt_f32("LLM_TEMPERATURE")?.unwrap_or(DEFAULT_TEMPERATURE);
    validate_range_f32("LLM_TEMPERATURE", temperature, 0.0, 1.0)?;

    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS);
    if max_tokens == 0 {
        return Err(ConfigError::OutOfRange {
            field: "LLM_MAX_TOKENS",
            detail: "expected a positive token count",
        }
        .into());
    }

    let timeout = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
    Ok((temperature, max_tokens, timeout))
}

/// Constructs the chat model config.
///
/// # Env
/// - `GROQ_API_KEY` (optional here, required by the chat client)
/// - `GROQ_BASE_URL`, `GROQ_MODEL`
/// - `LLM_TEMPERATURE` (validated in `[0, 1]`), `LLM_MAX_TOKENS`, `LLM_TIMEOUT_SECS`
///
/// # Defaults
/// - `endpoint = https://api.groq.com/openai`
/// - `model = llama-3.1-8b-instant`
/// - `temperature = 0.2`, `max_tokens = 400`, `timeout_secs = 60`
pub fn config_groq_chat() -> Result<LlmModelConfig> {
    let endpoint = env_opt("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string());
    validate_http_endpoint("GROQ_BASE_URL", &endpoint)?;

    let model = env_opt("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string());
    let (temperature, max_tokens, timeout) = generation_params()?;

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model,
        endpoint,
        api_key: env_opt("GROQ_API_KEY"),
        max_tokens: Some(max_tokens),
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(timeout),
    })
}

/// Constructs a local chat config served by Ollama.
///
/// # Env
/// - `OLLAMA_URL`, `OLLAMA_CHAT_MODEL`
/// - `LLM_TEMPERATURE`, `LLM_MAX_TOKENS`, `LLM_TIMEOUT_SECS`
///
/// # Defaults
/// - `model = llama3.1`
pub fn config_ollama_chat() -> Result<LlmModelConfig> {
    let endpoint = env_opt("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
    validate_http_endpoint("OLLAMA_URL", &endpoint)?;

    let model =
        env_opt("OLLAMA_CHAT_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_CHAT_MODEL.to_string());
    let (temperature, max_tokens, timeout) = generation_params()?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens: Some(max_tokens),
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(timeout),
    })
}

/// Constructs the embedding model config.
///
/// # Env
/// - `OLLAMA_URL`, `EMBEDDING_MODEL`
///
/// # Defaults
/// - `endpoint = http://127.0.0.1:11434`
/// - `model = all-minilm`
/// - `timeout_secs = 30`
pub fn config_ollama_embedding() -> Result<LlmModelConfig> {
    let endpoint = env_opt("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
    validate_http_endpoint("OLLAMA_URL", &endpoint)?;

    let model = env_opt("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(30),
    })
}
