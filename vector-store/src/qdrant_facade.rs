//! Qdrant backend behind the [`VectorIndex`] trait.
//!
//! Chunk ids are arbitrary strings while Qdrant wants integers or UUIDs, so
//! point ids are derived with [`stable_uuid`] and the original id is kept in
//! the payload under `id`.

use std::collections::HashMap;

use futures::future::BoxFuture;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, ListValue, PointStruct, SearchPointsBuilder, Struct,
    UpsertPointsBuilder, Value as QValue, VectorParamsBuilder, value::Kind, vectors_config,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::gateway::VectorIndex;
use crate::ids::stable_uuid;
use crate::record::{IndexInfo, UpsertEntry};
use crate::response::{QueryResponse, ScoredRecord};

pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dim: usize,
}

impl QdrantIndex {
    /// # Errors
    /// [`StoreError::Backend`] if the client cannot be built.
    pub fn new(
        url: &str,
        api_key: Option<&str>,
        collection: impl Into<String>,
        dim: usize,
    ) -> Result<Self, StoreError> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key.to_string());
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.into(),
            dim,
        })
    }

    /// Creates the collection (cosine, `dim` wide) when it does not exist.
    async fn ensure_collection(&self) -> Result<(), StoreError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        if exists {
            return Ok(());
        }
        self.create_collection().await
    }

    async fn create_collection(&self) -> Result<(), StoreError> {
        info!(collection = %self.collection, size = self.dim, "creating Qdrant collection");
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(self.dim as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

impl VectorIndex for QdrantIndex {
    fn query_raw<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> BoxFuture<'a, Result<QueryResponse, StoreError>> {
        Box::pin(async move {
            debug!(collection = %self.collection, top_k, "qdrant search");
            let res = self
                .client
                .search_points(
                    SearchPointsBuilder::new(&self.collection, vector.to_vec(), top_k as u64)
                        .with_payload(true),
                )
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;

            let records = res
                .result
                .into_iter()
                .map(|p| {
                    let metadata = qpayload_to_json(p.payload);
                    ScoredRecord {
                        id: metadata.get("id").and_then(Value::as_str).map(str::to_string),
                        score: Some(p.score),
                        metadata: Some(metadata),
                    }
                })
                .collect();
            Ok(QueryResponse::Typed(records))
        })
    }

    fn upsert<'a>(&'a self, entries: &'a [UpsertEntry]) -> BoxFuture<'a, Result<usize, StoreError>> {
        Box::pin(async move {
            self.ensure_collection()
                .await
                .map_err(|e| StoreError::Upsert(e.to_string()))?;

            let points: Vec<PointStruct> = entries.iter().map(to_point).collect();
            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
                .await
                .map_err(|e| StoreError::Upsert(e.to_string()))?;
            Ok(entries.len())
        })
    }

    fn reset(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let exists = self
                .client
                .collection_exists(&self.collection)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            if exists {
                self.client
                    .delete_collection(&self.collection)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
            }
            self.create_collection().await
        })
    }

    fn info(&self) -> BoxFuture<'_, Result<IndexInfo, StoreError>> {
        Box::pin(async move {
            let exists = self
                .client
                .collection_exists(&self.collection)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            if !exists {
                return Ok(IndexInfo::default());
            }

            let res = self
                .client
                .collection_info(&self.collection)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            let Some(info) = res.result else {
                return Ok(IndexInfo::default());
            };

            let dimension = info
                .config
                .and_then(|c| c.params)
                .and_then(|p| p.vectors_config)
                .and_then(|v| v.config)
                .and_then(|c| match c {
                    vectors_config::Config::Params(p) => Some(p.size as usize),
                    vectors_config::Config::ParamsMap(_) => None,
                });

            Ok(IndexInfo {
                dimension,
                vector_count: info.points_count.unwrap_or(0),
            })
        })
    }

    fn name(&self) -> &'static str {
        "qdrant"
    }
}

fn to_point(e: &UpsertEntry) -> PointStruct {
    let mut payload: HashMap<String, QValue> = e
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), json_to_qvalue(v.clone())))
        .collect();
    payload.insert("id".into(), json_to_qvalue(Value::String(e.id.clone())));

    PointStruct::new(stable_uuid(&e.id).to_string(), e.vector.clone(), payload)
}

/// Converts `serde_json::Value` into a Qdrant `Value` (arrays/objects included).
fn json_to_qvalue(v: Value) -> QValue {
    let kind = match v {
        Value::Null => None,
        Value::Bool(b) => Some(Kind::BoolValue(b)),
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Kind::IntegerValue(i),
            (None, Some(f)) => Kind::DoubleValue(f),
            _ => Kind::StringValue(n.to_string()),
        }),
        Value::String(s) => Some(Kind::StringValue(s)),
        Value::Array(arr) => Some(Kind::ListValue(ListValue {
            values: arr.into_iter().map(json_to_qvalue).collect(),
        })),
        Value::Object(map) => Some(Kind::StructValue(Struct {
            fields: map.into_iter().map(|(k, v)| (k, json_to_qvalue(v))).collect(),
        })),
    };
    QValue { kind }
}

/// Converts a Qdrant payload back into a JSON object.
fn qpayload_to_json(p: HashMap<String, QValue>) -> Map<String, Value> {
    p.into_iter().map(|(k, v)| (k, qvalue_to_json(v))).collect()
}

fn qvalue_to_json(v: QValue) -> Value {
    match v.kind {
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => serde_json::json!(f),
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::ListValue(l)) => Value::Array(l.values.into_iter().map(qvalue_to_json).collect()),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qvalue_to_json(v)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_survives_conversion() {
        let original = json!({"title": "Skills", "tags": ["rust", "go"], "years": 7, "nested": {"ok": true}});
        let q = json_to_qvalue(original.clone());
        assert_eq!(qvalue_to_json(q), original);
    }

    #[test]
    fn point_keeps_original_id() {
        let e = UpsertEntry {
            id: "chunk_1".into(),
            vector: vec![0.1, 0.2],
            metadata: json!({"title": "T"}).as_object().cloned().unwrap(),
        };
        let p = to_point(&e);
        let payload = qpayload_to_json(p.payload);
        assert_eq!(payload["id"], "chunk_1");
        assert_eq!(payload["title"], "T");
    }
}
