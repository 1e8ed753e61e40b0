//! Public result types for callers that want more than the answer text.

use serde::Serialize;
use vector_store::Hit;

use crate::error::Answer;

/// A retrieved chunk as it was shown to the model.
///
/// # Example
/// ```
/// use twin_rag::UsedChunk;
/// let c = UsedChunk {
///     score: Some(0.82),
///     title: "Skills".into(),
///     category: "technical".into(),
///     text: "Python, Go".into(),
/// };
/// assert_eq!(c.title, "Skills");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsedChunk {
    pub score: Option<f32>,
    pub title: String,
    pub category: String,
    pub text: String,
}

impl From<&Hit> for UsedChunk {
    fn from(hit: &Hit) -> Self {
        Self {
            score: hit.score,
            title: hit.title().to_string(),
            category: hit.category().to_string(),
            text: hit.text.clone(),
        }
    }
}

/// Final answer together with the hits it was generated from.
#[derive(Debug)]
pub struct QaAnswer {
    pub answer: Answer,
    pub context: Vec<UsedChunk>,
}
