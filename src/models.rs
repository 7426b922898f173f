//! Core data types flowing through the ingestion and search pipeline.

use serde::Serialize;

/// A record stored in the vector collection: one accepted upload.
#[derive(Debug, Clone)]
pub struct AssetRecord {
    /// Opaque unique id (UUID v4), assigned once at ingestion, never reused.
    pub id: String,
    /// L2-normalized embedding, length equals the collection dimension.
    pub vector: Vec<f32>,
    /// Logical storage location; unique among live records.
    pub path: String,
    /// User-assigned tags. Order irrelevant for matching.
    pub tags: Vec<String>,
    /// SHA-256 hex digest of the raw uploaded bytes.
    pub fingerprint: String,
}

/// One file in an ingestion request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A similarity-ranked candidate returned by the store.
#[derive(Debug, Clone)]
pub struct ScoredAsset {
    pub path: String,
    pub tags: Vec<String>,
    /// Cosine similarity to the query vector.
    pub score: f32,
}

/// A result returned to the caller by the hybrid search engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub tags: Vec<String>,
    /// True when the hit came from the tag-constrained phase.
    pub tag_match: bool,
}

/// Per-item failure recorded during ingestion (the item was dropped from the
/// batch; the rest of the batch proceeded).
#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub filename: String,
    pub reason: String,
}

/// Outcome of one ingestion request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Uploads accepted and indexed.
    pub added: usize,
    /// Uploads skipped as duplicates of already-indexed content.
    pub skipped: usize,
    /// Uploads that failed dedup or embedding and were dropped.
    pub failures: Vec<IngestFailure>,
}
