//! Typed errors and the tagged answer returned by the pipeline.

use std::fmt;

use llm_service::LlmServiceError;
use thiserror::Error;
use vector_store::StoreError;

/// Prefix that marks a failure answer.
pub const ERROR_MARKER: &str = "❌";

pub const MISSING_QUESTION_TEXT: &str = "Please provide a question.";
pub const NOT_FOUND_TEXT: &str = "I couldn't find relevant information in the digital twin.";

#[derive(Debug, Error)]
pub enum TwinError {
    /// The embedding model failed to load or encode.
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The vector-store call failed or returned malformed data.
    #[error("Vector query failed: {0}")]
    QueryError(String),

    /// An ingestion write failed.
    #[error("Upsert failed: {0}")]
    UpsertError(String),

    /// The language-model call failed.
    #[error("Error generating response: {0}")]
    GenerationError(String),

    /// The input was rejected before any backend call.
    #[error("Invalid input: {0}")]
    ValidationError(String),

    /// Setup-phase failure.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for TwinError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmbeddingUnavailable(m) => Self::EmbeddingUnavailable(m),
            StoreError::Upsert(m) => Self::UpsertError(m),
            StoreError::Config(m) => Self::Config(m),
            other => Self::QueryError(other.to_string()),
        }
    }
}

impl From<LlmServiceError> for TwinError {
    fn from(e: LlmServiceError) -> Self {
        match e {
            LlmServiceError::Config(c) => Self::Config(c.to_string()),
            other => Self::GenerationError(other.to_string()),
        }
    }
}

/// Terminal value of one pipeline call. Always displayable.
#[derive(Debug)]
pub enum Answer {
    /// Trimmed model output.
    Generated(String),
    /// The question was empty or whitespace.
    MissingQuestion,
    /// Nothing relevant was retrieved; the model was not called.
    NotFound,
    Failed(TwinError),
}

impl Answer {
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Display text, same as `to_string()`.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated(text) => f.write_str(text),
            Self::MissingQuestion => f.write_str(MISSING_QUESTION_TEXT),
            Self::NotFound => f.write_str(NOT_FOUND_TEXT),
            Self::Failed(e) => write!(f, "{ERROR_MARKER} {e}"),
        }
    }
}
