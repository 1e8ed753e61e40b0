//! Profile ingestion: profile JSON → chunks → fixed-D vectors → index.
//!
//! Two document layouts are accepted:
//! - a `content_chunks` (or `chunks`) list of `{id|uid, title, content|text, metadata}`
//! - a structured profile (`personal`, `career_goals`, `experience`, `skills`,
//!   `education`, `interview_prep`), flattened into one chunk per section.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::embed::Embedder;
use crate::errors::StoreError;
use crate::gateway::VectorStoreGateway;
use crate::record::{Chunk, UpsertEntry};

/// Characters of section text kept in fallback metadata.
const SECTION_TEXT_CHARS: usize = 500;

/// Reads and parses a profile document.
///
/// # Errors
/// [`StoreError::Io`] / [`StoreError::Parse`] for unreadable files.
pub fn load_profile(path: impl AsRef<Path>) -> Result<Vec<Chunk>, StoreError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&raw)?;
    let chunks = chunks_from_profile(&doc);
    info!(path = %path.display(), chunks = chunks.len(), "profile loaded");
    Ok(chunks)
}

/// Maps a parsed profile document into chunks.
pub fn chunks_from_profile(doc: &Value) -> Vec<Chunk> {
    let listed = doc
        .get("content_chunks")
        .or_else(|| doc.get("chunks"))
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty());

    match listed {
        Some(items) => items.iter().filter_map(map_listed_chunk).collect(),
        None => {
            debug!("no chunk list in profile; flattening sections");
            section_chunks(doc)
        }
    }
}

fn pick_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// One `content_chunks` entry. Non-objects are skipped.
fn map_listed_chunk(v: &Value) -> Option<Chunk> {
    let obj = v.as_object()?;

    let title = pick_str(obj, &["title"]).unwrap_or("").to_string();
    let id = match obj.get("id").or_else(|| obj.get("uid")) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => title.chars().take(8).collect(),
    };
    let content = pick_str(obj, &["content", "text"]).unwrap_or("").to_string();

    let mut metadata = match obj.get("metadata") {
        Some(Value::Object(m)) => m.clone(),
        _ => Map::new(),
    };
    let category = metadata
        .get("category")
        .and_then(Value::as_str)
        .or_else(|| pick_str(obj, &["category"]))
        .unwrap_or("")
        .to_string();

    metadata.insert("title".into(), Value::String(title.clone()));
    metadata.insert("content".into(), Value::String(content.clone()));
    metadata.insert("category".into(), Value::String(category.clone()));
    if !metadata.contains_key("tags") {
        metadata.insert("tags".into(), Value::Array(Vec::new()));
    }
    if let Some(kind) = obj.get("type") {
        metadata.insert("type".into(), kind.clone());
    }

    Some(Chunk {
        id,
        title,
        category,
        content,
        metadata,
    })
}

/// Flattens structured profile sections, numbering ids `chunk_1..`.
///
/// Missing sections are skipped.
fn section_chunks(doc: &Value) -> Vec<Chunk> {
    let present = move |key: &str| doc.get(key).filter(|v| !v.is_null());

    let mut sections: Vec<(String, &Value, &str)> = Vec::new();
    for (category, key, section) in [
        ("Personal", "personal", "personal"),
        ("Career Goals", "career_goals", "career"),
    ] {
        if let Some(v) = present(key) {
            sections.push((category.to_string(), v, section));
        }
    }
    for exp in doc
        .get("experience")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let title = exp.get("title").and_then(Value::as_str).unwrap_or("");
        sections.push((format!("Experience - {title}"), exp, "experience"));
    }
    for (category, key, section) in [
        ("Skills", "skills", "skills"),
        ("Education", "education", "education"),
        ("Interview Prep", "interview_prep", "interview"),
    ] {
        if let Some(v) = present(key) {
            sections.push((category.to_string(), v, section));
        }
    }

    sections
        .into_iter()
        .enumerate()
        .map(|(i, (category, value, section))| {
            let text = render_section(&category, value);
            let mut metadata = Map::new();
            metadata.insert(
                "text".into(),
                Value::String(text.chars().take(SECTION_TEXT_CHARS).collect()),
            );
            metadata.insert("category".into(), Value::String(category.clone()));
            metadata.insert("section".into(), Value::String(section.to_string()));
            Chunk {
                id: format!("chunk_{}", i + 1),
                title: String::new(),
                category,
                content: text,
                metadata,
            }
        })
        .collect()
}

/// Objects → `"{category}\n{k}: {v}"` lines (nested values as JSON);
/// anything else → `"{category}: {value}"`.
fn render_section(category: &str, value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let lines: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k}: {}", scalar_text(v)))
                .collect();
            format!("{category}\n{}", lines.join("\n"))
        }
        other => format!("{category}: {}", scalar_text(other)),
    }
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Knobs for one ingestion run.
#[derive(Clone, Debug)]
pub struct IngestOptions {
    /// Clear the index before writing.
    pub reset: bool,
    /// Entries per upsert call.
    pub batch: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            reset: false,
            batch: 100,
        }
    }
}

/// Embeds chunks and writes them through the gateway.
pub struct Ingestor {
    embedder: Arc<Embedder>,
    gateway: Arc<VectorStoreGateway>,
}

impl Ingestor {
    pub fn new(embedder: Arc<Embedder>, gateway: Arc<VectorStoreGateway>) -> Self {
        Self { embedder, gateway }
    }

    /// Embeds every chunk and upserts in batches. Returns the written count.
    ///
    /// A failed reset is logged and ingestion continues.
    ///
    /// # Errors
    /// [`StoreError::EmbeddingUnavailable`] if a chunk cannot be embedded,
    /// [`StoreError::Upsert`] if a batch write fails.
    pub async fn ingest(&self, chunks: &[Chunk], opts: &IngestOptions) -> Result<usize, StoreError> {
        if opts.reset {
            if let Err(e) = self.gateway.reset().await {
                warn!(error = %e, "could not clear index; continuing");
            }
        }
        if chunks.is_empty() {
            info!("no chunks to ingest");
            return Ok(0);
        }

        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = self.embedder.embed(&chunk.enriched_text()).await?;
            entries.push(UpsertEntry {
                id: chunk.id.clone(),
                vector,
                metadata: chunk.metadata.clone(),
            });
        }

        let mut total = 0usize;
        for batch in entries.chunks(opts.batch.max(1)) {
            total += self.gateway.upsert(batch).await?;
            debug!(written = total, of = entries.len(), "upsert batch done");
        }

        info!(count = total, backend = self.gateway.backend_name(), "ingestion finished");
        Ok(total)
    }

    /// Ingests only when the index reports zero vectors.
    ///
    /// Returns `Ok(None)` when the index already has data.
    pub async fn ingest_if_empty(
        &self,
        chunks: &[Chunk],
        opts: &IngestOptions,
    ) -> Result<Option<usize>, StoreError> {
        let info = self.gateway.check_dimension().await?;
        if info.vector_count > 0 {
            debug!(vectors = info.vector_count, "index already populated; skipping ingestion");
            return Ok(None);
        }
        self.ingest(chunks, opts).await.map(Some)
    }
}
