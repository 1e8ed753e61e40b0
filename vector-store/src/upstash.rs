//! Upstash Vector REST backend.
//!
//! - `POST {url}/query`  `{vector, topK, includeMetadata}`
//! - `POST {url}/upsert` `[{id, vector, metadata}]`
//! - `DELETE {url}/reset`
//! - `GET {url}/info`
//!
//! Every response is wrapped as `{"result": ...}` or `{"error": ...}`.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::StoreError;
use crate::gateway::VectorIndex;
use crate::record::{IndexInfo, UpsertEntry};
use crate::response::QueryResponse;

pub struct UpstashIndex {
    client: reqwest::Client,
    base: String,
}

impl UpstashIndex {
    /// # Errors
    /// [`StoreError::Config`] for a malformed URL or token,
    /// [`StoreError::Http`] if the client cannot be built.
    pub fn new(url: &str, token: &str) -> Result<Self, StoreError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StoreError::Config(format!("invalid Upstash URL: {url}")));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| StoreError::Config(format!("invalid Upstash token: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base: url.trim_end_matches('/').to_string(),
        })
    }

    async fn send(&self, req: reqwest::RequestBuilder, url: &str) -> Result<Value, StoreError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let snippet: String = text.trim().chars().take(240).collect();
            error!(%status, %url, %snippet, "Upstash returned non-success status");
            return Err(StoreError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
                snippet,
            });
        }
        Ok(resp.json::<Value>().await?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoBody {
    #[serde(default)]
    vector_count: u64,
    #[serde(default)]
    dimension: Option<usize>,
}

/// Unwraps the `result` envelope, turning `error` into `on_error(msg)`.
fn unwrap_envelope(body: Value, on_error: fn(String) -> StoreError) -> Result<Value, StoreError> {
    match body {
        Value::Object(mut obj) => {
            if let Some(err) = obj.remove("error") {
                return Err(on_error(match err {
                    Value::String(s) => s,
                    other => other.to_string(),
                }));
            }
            obj.remove("result")
                .ok_or_else(|| StoreError::Decode("missing `result` in Upstash response".into()))
        }
        other => Ok(other),
    }
}

impl VectorIndex for UpstashIndex {
    fn query_raw<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> BoxFuture<'a, Result<QueryResponse, StoreError>> {
        Box::pin(async move {
            let url = format!("{}/query", self.base);
            debug!(top_k, dim = vector.len(), "POST {}", url);
            let body = QueryBody {
                vector,
                top_k,
                include_metadata: true,
            };
            let raw = self.send(self.client.post(&url).json(&body), &url).await?;
            QueryResponse::from_json(raw)
        })
    }

    fn upsert<'a>(&'a self, entries: &'a [UpsertEntry]) -> BoxFuture<'a, Result<usize, StoreError>> {
        Box::pin(async move {
            let url = format!("{}/upsert", self.base);
            debug!(count = entries.len(), "POST {}", url);
            let raw = self.send(self.client.post(&url).json(entries), &url).await?;
            unwrap_envelope(raw, StoreError::Upsert)?;
            Ok(entries.len())
        })
    }

    fn reset(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let url = format!("{}/reset", self.base);
            debug!("DELETE {}", url);
            let raw = self.send(self.client.delete(&url), &url).await?;
            unwrap_envelope(raw, StoreError::Backend)?;
            Ok(())
        })
    }

    fn info(&self) -> BoxFuture<'_, Result<IndexInfo, StoreError>> {
        Box::pin(async move {
            let url = format!("{}/info", self.base);
            debug!("GET {}", url);
            let raw = self.send(self.client.get(&url), &url).await?;
            let body: InfoBody = serde_json::from_value(unwrap_envelope(raw, StoreError::Backend)?)?;
            Ok(IndexInfo {
                dimension: body.dimension,
                vector_count: body.vector_count,
            })
        })
    }

    fn name(&self) -> &'static str {
        "upstash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_body_uses_camel_case() {
        let v = serde_json::to_value(QueryBody {
            vector: &[0.5, 0.0],
            top_k: 3,
            include_metadata: true,
        })
        .unwrap();
        assert_eq!(v, json!({"vector": [0.5, 0.0], "topK": 3, "includeMetadata": true}));
    }

    #[test]
    fn envelope_unwraps_and_maps_errors() {
        assert_eq!(
            unwrap_envelope(json!({"result": "Success"}), StoreError::Upsert).unwrap(),
            json!("Success")
        );
        assert!(matches!(
            unwrap_envelope(json!({"error": "dimension mismatch"}), StoreError::Upsert),
            Err(StoreError::Upsert(m)) if m == "dimension mismatch"
        ));
    }

    #[test]
    fn info_body_decodes() {
        let raw = json!({"result": {"vectorCount": 12, "pendingVectorCount": 0, "dimension": 1536, "similarityFunction": "COSINE"}});
        let body: InfoBody =
            serde_json::from_value(unwrap_envelope(raw, StoreError::Backend).unwrap()).unwrap();
        assert_eq!(body.vector_count, 12);
        assert_eq!(body.dimension, Some(1536));
    }

    #[test]
    fn rejects_url_without_scheme() {
        assert!(UpstashIndex::new("x.upstash.io", "t").is_err());
        let idx = UpstashIndex::new("https://x.upstash.io/", "t").unwrap();
        assert_eq!(idx.base, "https://x.upstash.io");
    }
}
