//! Store configuration loaded from environment variables.

use crate::errors::StoreError;

/// Default fixed dimension every embedding is fitted to.
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Which vector index backs the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Upstash Vector over its REST API.
    Upstash,
    /// Self-hosted or cloud Qdrant over gRPC.
    Qdrant,
}

/// Config bag for the store side of the pipeline.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub backend: BackendKind,

    pub upstash_url: Option<String>,
    pub upstash_token: Option<String>,

    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection: String,

    /// Target dimension D every vector is fitted to.
    pub embedding_dim: usize,
    /// Upsert batch size during ingestion.
    pub upsert_batch: usize,
}

impl StoreConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the config from any key lookup (the environment in production).
    ///
    /// # Errors
    /// [`StoreError::Config`] for unknown backends, unparsable numbers, or a
    /// failed [`StoreConfig::validate`].
    pub fn from_lookup<F>(get: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| get(k).filter(|v| !v.trim().is_empty());

        let backend = match get("VECTOR_BACKEND")
            .unwrap_or_else(|| "upstash".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "upstash" => BackendKind::Upstash,
            "qdrant" => BackendKind::Qdrant,
            other => {
                return Err(StoreError::Config(format!(
                    "VECTOR_BACKEND must be `upstash` or `qdrant`, got `{other}`"
                )));
            }
        };

        let cfg = Self {
            backend,
            upstash_url: get("UPSTASH_VECTOR_REST_URL"),
            upstash_token: get("UPSTASH_VECTOR_REST_TOKEN"),
            qdrant_url: get("QDRANT_URL").unwrap_or_else(|| "http://127.0.0.1:6334".into()),
            qdrant_api_key: get("QDRANT_API_KEY"),
            collection: get("QDRANT_COLLECTION").unwrap_or_else(|| "digital_twin".into()),
            embedding_dim: parse_num(&get, "EMBEDDING_DIM", DEFAULT_EMBEDDING_DIM)?,
            upsert_batch: parse_num(&get, "UPSERT_BATCH", 100)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values for the selected backend.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.embedding_dim == 0 {
            return Err(StoreError::Config("EMBEDDING_DIM must be > 0".into()));
        }
        if self.upsert_batch == 0 {
            return Err(StoreError::Config("UPSERT_BATCH must be > 0".into()));
        }
        match self.backend {
            BackendKind::Upstash => {
                let url = self.upstash_url.as_deref().ok_or_else(|| {
                    StoreError::Config("UPSTASH_VECTOR_REST_URL is not set".into())
                })?;
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(StoreError::Config(
                        "UPSTASH_VECTOR_REST_URL must start with http:// or https://".into(),
                    ));
                }
                if self.upstash_token.is_none() {
                    return Err(StoreError::Config(
                        "UPSTASH_VECTOR_REST_TOKEN is not set".into(),
                    ));
                }
            }
            BackendKind::Qdrant => {
                if self.qdrant_url.trim().is_empty() {
                    return Err(StoreError::Config("QDRANT_URL is empty".into()));
                }
                if self.collection.trim().is_empty() {
                    return Err(StoreError::Config("QDRANT_COLLECTION is empty".into()));
                }
            }
        }
        Ok(())
    }
}

fn parse_num<F>(get: &F, key: &str, dflt: usize) -> Result<usize, StoreError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| StoreError::Config(format!("{key} must be a positive integer, got `{v}`"))),
        None => Ok(dflt),
    }
}
