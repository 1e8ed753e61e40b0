//! Normalization of heterogeneous similarity-query responses.
//!
//! Stores answer a query in one of a few shapes. Each shape is a variant of
//! [`QueryResponse`] with its own adapter into [`Hit`]s, so nothing is
//! tried speculatively.

use serde_json::{Map, Value};

use crate::errors::StoreError;
use crate::record::Hit;

/// A decoded record from a typed client (field access instead of JSON keys).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoredRecord {
    pub id: Option<String>,
    pub score: Option<f32>,
    pub metadata: Option<Map<String, Value>>,
}

/// Raw query response, tagged by shape.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResponse {
    /// `{"results": [...]}`
    Results(Vec<Value>),
    /// `{"matches": [...]}`
    Matches(Vec<Value>),
    /// `[...]`
    Bare(Vec<Value>),
    /// Records decoded by an SDK.
    Typed(Vec<ScoredRecord>),
}

impl QueryResponse {
    /// Classifies a JSON body.
    ///
    /// The Upstash `{"result": ...}` envelope is unwrapped first and an
    /// `{"error": ...}` envelope becomes [`StoreError::Query`].
    ///
    /// # Errors
    /// [`StoreError::Decode`] when the body matches no known shape.
    pub fn from_json(body: Value) -> Result<Self, StoreError> {
        match body {
            Value::Array(items) => Ok(Self::Bare(items)),
            Value::Object(mut obj) => {
                if let Some(err) = obj.remove("error") {
                    return Err(StoreError::Query(match err {
                        Value::String(s) => s,
                        other => other.to_string(),
                    }));
                }
                if let Some(inner) = obj.remove("result") {
                    return Self::from_json(inner);
                }
                if let Some(Value::Array(items)) = obj.remove("results") {
                    return Ok(Self::Results(items));
                }
                if let Some(Value::Array(items)) = obj.remove("matches") {
                    return Ok(Self::Matches(items));
                }
                Err(StoreError::Decode(
                    "expected `results`, `matches`, `result` or a list".into(),
                ))
            }
            other => Err(StoreError::Decode(format!(
                "unexpected query response: {}",
                kind_of(&other)
            ))),
        }
    }

    /// Converts into hits, preserving backend order.
    pub fn into_hits(self) -> Vec<Hit> {
        match self {
            Self::Results(items) | Self::Matches(items) | Self::Bare(items) => {
                items.into_iter().filter_map(hit_from_json).collect()
            }
            Self::Typed(records) => records.into_iter().map(hit_from_record).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Results(v) | Self::Matches(v) | Self::Bare(v) => v.len(),
            Self::Typed(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Adapter for mapping-style items. Non-object items are skipped.
fn hit_from_json(item: Value) -> Option<Hit> {
    let Value::Object(mut obj) = item else {
        return None;
    };
    let score = obj.get("score").and_then(Value::as_f64).map(|s| s as f32);
    let metadata = match obj.remove("metadata").or_else(|| obj.remove("payload")) {
        Some(Value::Object(m)) => m,
        _ => Map::new(),
    };
    Some(Hit::new(score, metadata))
}

fn hit_from_record(rec: ScoredRecord) -> Hit {
    Hit::new(rec.score, rec.metadata.unwrap_or_default())
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
