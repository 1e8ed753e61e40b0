//! Retrieval-augmented answers in the voice of a profile's owner.
//!
//! A question is embedded, matched against the vector store, turned into a
//! context block and a two-message prompt, and answered by a chat model.
//! Every path ends in a displayable [`Answer`]; backend failures degrade
//! instead of propagating.
//!
//! Wiring happens once in [`TwinServices::from_config`]; each
//! [`RagPipeline::answer`] call is independent.

mod api_types;
mod cfg;
mod context;
mod error;
mod generate;
mod pipeline;
mod progress;
pub mod prompt;
mod retrieve;
mod services;

pub use api_types::{QaAnswer, UsedChunk};
pub use cfg::{DEFAULT_MAX_CTX_CHARS, DEFAULT_PROFILE_PATH, RagSettings, TwinConfig};
pub use context::{ContextAssembler, ContextBlock, SEPARATOR};
pub use error::{Answer, ERROR_MARKER, MISSING_QUESTION_TEXT, NOT_FOUND_TEXT, TwinError};
pub use generate::{ChatBackend, GenerationParams, Generator};
pub use pipeline::RagPipeline;
pub use progress::{IndicatifProgress, NoopProgress, PipelineState, Progress};
pub use prompt::{DEFAULT_PERSONA, Prompt};
pub use retrieve::Retriever;
pub use services::{StartupReport, TwinServices};
