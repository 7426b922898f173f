//! Asset Index abstraction.
//!
//! The [`AssetStore`] trait is the only seam through which the rest of the
//! pipeline touches the vector collection, enabling pluggable backends
//! (SQLite for the service, in-memory for tests). Implementations must be
//! `Send + Sync` to be shared across request handlers.
//!
//! Ids are opaque UUID strings assigned at ingestion. The collection
//! dimension is fixed when a store is constructed; vectors of any other
//! length are rejected at this boundary with
//! [`InvalidDimension`](crate::error::AssetError::InvalidDimension).

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::AssetResult;
use crate::models::{AssetRecord, ScoredAsset};

/// Abstract vector collection backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`ensure_collection`](AssetStore::ensure_collection) | Idempotent collection/schema creation |
/// | [`upsert`](AssetStore::upsert) | Insert or overwrite records by id |
/// | [`delete_by_path`](AssetStore::delete_by_path) | Remove all records at a path |
/// | [`update_tags`](AssetStore::update_tags) | Wholesale tag replacement for a path |
/// | [`fingerprint_exists`](AssetStore::fingerprint_exists) | Exact-match dedup lookup |
/// | [`similarity_search`](AssetStore::similarity_search) | Cosine-ranked nearest neighbors |
/// | [`count`](AssetStore::count) | Number of live records |
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Create the collection if it does not exist; otherwise a no-op.
    /// Safe to call on every process start.
    async fn ensure_collection(&self) -> AssetResult<()>;

    /// Write a batch of records, overwriting on id collision.
    ///
    /// Atomicity across the batch is best-effort: callers must not rely on
    /// all-or-nothing visibility of a single call.
    async fn upsert(&self, records: &[AssetRecord]) -> AssetResult<()>;

    /// Remove every record whose path matches exactly. Idempotent; returns
    /// the number removed (0 when nothing matched).
    async fn delete_by_path(&self, path: &str) -> AssetResult<u64>;

    /// Replace the tags of the record at `path`. Returns `false` when no
    /// record matched (a no-op, not an error).
    async fn update_tags(&self, path: &str, tags: &[String]) -> AssetResult<bool>;

    /// Exact-match existence check on the stored content fingerprint.
    async fn fingerprint_exists(&self, fingerprint: &str) -> AssetResult<bool>;

    /// Nearest neighbors by cosine similarity, optionally restricted to
    /// records whose tag list contains `tag`. Results are ordered score
    /// descending, ties broken by path ascending, truncated to `limit`.
    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
        tag: Option<&str>,
    ) -> AssetResult<Vec<ScoredAsset>>;

    /// Number of live records in the collection.
    async fn count(&self) -> AssetResult<u64>;
}
