//! In-memory [`AssetStore`] used as a test double.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`; similarity search is
//! brute-force cosine over everything stored. Behavior matches the SQLite
//! backend, including dimension checks and deterministic ordering.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::error::{AssetError, AssetResult};
use crate::models::{AssetRecord, ScoredAsset};

use super::AssetStore;

pub struct MemoryStore {
    records: RwLock<Vec<AssetRecord>>,
    dims: usize,
}

impl MemoryStore {
    pub fn new(dims: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            dims,
        }
    }

    /// Ids currently in the store, in insertion order.
    pub fn ids(&self) -> Vec<String> {
        self.records
            .read()
            .unwrap()
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }

    fn check_dims(&self, found: usize) -> AssetResult<()> {
        if found != self.dims {
            return Err(AssetError::InvalidDimension {
                expected: self.dims,
                found,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn ensure_collection(&self) -> AssetResult<()> {
        Ok(())
    }

    async fn upsert(&self, records: &[AssetRecord]) -> AssetResult<()> {
        for record in records {
            self.check_dims(record.vector.len())?;
        }
        let mut stored = self.records.write().unwrap();
        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
        }
        Ok(())
    }

    async fn delete_by_path(&self, path: &str) -> AssetResult<u64> {
        let mut stored = self.records.write().unwrap();
        let before = stored.len();
        stored.retain(|r| r.path != path);
        Ok((before - stored.len()) as u64)
    }

    async fn update_tags(&self, path: &str, tags: &[String]) -> AssetResult<bool> {
        let mut stored = self.records.write().unwrap();
        match stored.iter_mut().find(|r| r.path == path) {
            Some(record) => {
                record.tags = tags.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn fingerprint_exists(&self, fingerprint: &str) -> AssetResult<bool> {
        let stored = self.records.read().unwrap();
        Ok(stored.iter().any(|r| r.fingerprint == fingerprint))
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
        tag: Option<&str>,
    ) -> AssetResult<Vec<ScoredAsset>> {
        self.check_dims(query.len())?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let stored = self.records.read().unwrap();
        let mut candidates: Vec<ScoredAsset> = stored
            .iter()
            .filter(|r| match tag {
                Some(t) => r.tags.iter().any(|x| x == t),
                None => true,
            })
            .map(|r| ScoredAsset {
                path: r.path.clone(),
                tags: r.tags.clone(),
                score: cosine_similarity(query, &r.vector),
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });
        candidates.truncate(limit);

        Ok(candidates)
    }

    async fn count(&self) -> AssetResult<u64> {
        Ok(self.records.read().unwrap().len() as u64)
    }
}
