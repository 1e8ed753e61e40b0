//! HTTP clients for the language-model and embedding backends.
//!
//! - [`services::open_ai_service::OpenAiService`] talks to any
//!   OpenAI-compatible chat endpoint (Groq by default).
//! - [`services::ollama_service::OllamaService`] computes native embeddings
//!   and can also serve chat completions locally.
//! - [`health_service::HealthService`] checks both providers.
//!
//! Configuration lives in [`config`], errors in [`error_handler`], and the
//! library-scoped tracing layer in [`telemetry`].

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{LlmServiceError, Result};
pub use services::completion::CompletionShape;
pub use services::{ChatMessage, ChatRequest, Role};
