//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;

use llm_service::LlmModelConfig;
use llm_service::config::default_config::{config_chat, config_ollama_embedding};
use vector_store::{DEFAULT_EMBEDDING_DIM, DEFAULT_TOP_K, StoreConfig};

use crate::error::TwinError;
use crate::prompt::DEFAULT_PERSONA;

pub const DEFAULT_MAX_CTX_CHARS: usize = 6000;
pub const DEFAULT_PROFILE_PATH: &str = "digitaltwin.json";

/// Pipeline knobs that are not owned by a backend crate.
#[derive(Clone, Debug, PartialEq)]
pub struct RagSettings {
    pub top_k: usize,
    pub max_ctx_chars: usize,
    pub persona: String,
    pub profile_path: PathBuf,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_ctx_chars: DEFAULT_MAX_CTX_CHARS,
            persona: DEFAULT_PERSONA.to_string(),
            profile_path: PathBuf::from(DEFAULT_PROFILE_PATH),
        }
    }
}

impl RagSettings {
    /// # Env
    /// `RAG_TOP_K`, `MAX_CTX_CHARS`, `TWIN_PERSONA`, `DIGITALTWIN_JSON`
    pub fn from_lookup<F>(get: F) -> Result<Self, TwinError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        let dflt = Self::default();

        let top_k = parse(&get, "RAG_TOP_K", dflt.top_k)?;
        if top_k == 0 {
            return Err(TwinError::Config("RAG_TOP_K must be >= 1".into()));
        }

        Ok(Self {
            top_k,
            max_ctx_chars: parse(&get, "MAX_CTX_CHARS", dflt.max_ctx_chars)?,
            persona: get("TWIN_PERSONA").unwrap_or(dflt.persona),
            profile_path: get("DIGITALTWIN_JSON")
                .map(PathBuf::from)
                .unwrap_or(dflt.profile_path),
        })
    }
}

/// Everything needed to wire the digital twin.
#[derive(Clone, Debug)]
pub struct TwinConfig {
    /// Store settings, or why they could not be read.
    pub store: Result<StoreConfig, String>,
    pub chat: LlmModelConfig,
    pub embedding: LlmModelConfig,
    pub rag: RagSettings,
}

impl TwinConfig {
    /// Reads the process environment (after `.env` has been loaded).
    ///
    /// A store that is not configured is not fatal here; the error is kept in
    /// `store` so the caller can still run with the other backends.
    ///
    /// # Errors
    /// [`TwinError::Config`] for invalid model or pipeline settings.
    pub fn from_env() -> Result<Self, TwinError> {
        Ok(Self {
            store: StoreConfig::from_env().map_err(|e| e.to_string()),
            chat: config_chat()?,
            embedding: config_ollama_embedding()?,
            rag: RagSettings::from_lookup(|k| std::env::var(k).ok())?,
        })
    }

    /// Target embedding dimension, falling back to the default without a store.
    pub fn embedding_dim(&self) -> usize {
        self.store
            .as_ref()
            .map(|s| s.embedding_dim)
            .unwrap_or(DEFAULT_EMBEDDING_DIM)
    }
}

fn parse<F>(get: &F, key: &str, dflt: usize) -> Result<usize, TwinError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| TwinError::Config(format!("{key} must be an integer, got `{v}`"))),
        None => Ok(dflt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let s = RagSettings::from_lookup(|_| None).unwrap();
        assert_eq!(s, RagSettings::default());
        assert_eq!(s.top_k, 3);
        assert_eq!(s.max_ctx_chars, 6000);
    }

    #[test]
    fn overrides_and_validation() {
        let s = RagSettings::from_lookup(|k| match k {
            "RAG_TOP_K" => Some("5".into()),
            "TWIN_PERSONA" => Some("You are Ada.".into()),
            "DIGITALTWIN_JSON" => Some("data/profile.json".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(s.top_k, 5);
        assert_eq!(s.persona, "You are Ada.");
        assert_eq!(s.profile_path, PathBuf::from("data/profile.json"));

        assert!(RagSettings::from_lookup(|k| (k == "RAG_TOP_K").then(|| "0".into())).is_err());
        assert!(
            RagSettings::from_lookup(|k| (k == "MAX_CTX_CHARS").then(|| "lots".into())).is_err()
        );
    }
}
