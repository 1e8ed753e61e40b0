//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata keys searched for display text, in priority order.
pub const TEXT_KEYS: &[&str] = &["content", "text", "title"];

/// A unit of profile knowledge produced by ingestion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Chunk {
    /// Text handed to the embedder: `"{title}: {content}"`, or bare content.
    pub fn enriched_text(&self) -> String {
        if self.title.trim().is_empty() {
            self.content.clone()
        } else {
            format!("{}: {}", self.title, self.content)
        }
    }
}

/// One similarity-search result.
///
/// `score` is whatever the backend reports (higher = more similar);
/// `None` when the backend omitted it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Hit {
    pub score: Option<f32>,
    pub metadata: Map<String, Value>,
    /// Display text resolved from `metadata` via [`resolve_text`].
    pub text: String,
}

impl Hit {
    /// Builds a hit, deriving its display text from `metadata`.
    pub fn new(score: Option<f32>, metadata: Map<String, Value>) -> Self {
        let text = resolve_text(&metadata);
        Self {
            score,
            metadata,
            text,
        }
    }

    /// `title`, else `section`, else `""`.
    pub fn title(&self) -> &str {
        match self.str_field("title") {
            "" => self.str_field("section"),
            t => t,
        }
    }

    pub fn category(&self) -> &str {
        self.str_field("category")
    }

    fn str_field(&self, key: &str) -> &str {
        self.metadata.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

/// First non-empty string among `content`, `text`, `title`; else `""`.
pub fn resolve_text(metadata: &Map<String, Value>) -> String {
    TEXT_KEYS
        .iter()
        .filter_map(|k| metadata.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

/// A vector plus payload, ready to be written to the index.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpsertEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Map<String, Value>,
}

/// Summary reported by the index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexInfo {
    /// Configured vector dimension, when the backend reports it.
    pub dimension: Option<usize>,
    pub vector_count: u64,
}
