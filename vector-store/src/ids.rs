use uuid::Uuid;

/// Deterministic UUIDv5 from an arbitrary string id.
///
/// Qdrant only accepts integer or UUID point ids; chunk ids like `chunk_3`
/// are mapped through this so re-ingestion overwrites the same points.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}
