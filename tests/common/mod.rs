//! Shared test doubles for the integration suites.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use latent_assets::embedding::Embedder;
use latent_assets::error::{AssetError, AssetResult};
use latent_assets::models::{AssetRecord, ScoredAsset};
use latent_assets::store::AssetStore;

/// Deterministic embedder: the vector is derived from a SHA-256 of the
/// input, so identical inputs embed identically and distinct inputs differ.
/// Output is L2-normalized, matching the gateway contract.
pub struct StubEmbedder {
    pub dims: usize,
}

fn seeded_unit_vector(seed: &[u8], dims: usize) -> Vec<f32> {
    let digest = Sha256::digest(seed);
    let mut v: Vec<f32> = (0..dims)
        .map(|i| f32::from(digest[i % digest.len()]) + 1.0)
        .collect();
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    for x in &mut v {
        *x /= norm;
    }
    v
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_text(&self, text: &str) -> AssetResult<Vec<f32>> {
        Ok(seeded_unit_vector(text.as_bytes(), self.dims))
    }

    async fn embed_image(&self, _filename: &str, bytes: &[u8]) -> AssetResult<Vec<f32>> {
        Ok(seeded_unit_vector(bytes, self.dims))
    }
}

/// Embedder that refuses payloads containing a marker byte sequence,
/// simulating a gateway outage for specific items.
pub struct FlakyEmbedder {
    pub dims: usize,
    pub poison: Vec<u8>,
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_text(&self, text: &str) -> AssetResult<Vec<f32>> {
        Ok(seeded_unit_vector(text.as_bytes(), self.dims))
    }

    async fn embed_image(&self, _filename: &str, bytes: &[u8]) -> AssetResult<Vec<f32>> {
        if bytes
            .windows(self.poison.len())
            .any(|w| w == self.poison.as_slice())
        {
            return Err(AssetError::EmbeddingUnavailable {
                reason: "simulated gateway outage".to_string(),
            });
        }
        Ok(seeded_unit_vector(bytes, self.dims))
    }
}

/// Store whose dedup lookup always fails, simulating an unreachable index
/// during the existence check.
pub struct DedupOutageStore<S> {
    pub inner: S,
}

#[async_trait]
impl<S: AssetStore> AssetStore for DedupOutageStore<S> {
    async fn ensure_collection(&self) -> AssetResult<()> {
        self.inner.ensure_collection().await
    }

    async fn upsert(&self, records: &[AssetRecord]) -> AssetResult<()> {
        self.inner.upsert(records).await
    }

    async fn delete_by_path(&self, path: &str) -> AssetResult<u64> {
        self.inner.delete_by_path(path).await
    }

    async fn update_tags(&self, path: &str, tags: &[String]) -> AssetResult<bool> {
        self.inner.update_tags(path, tags).await
    }

    async fn fingerprint_exists(&self, _fingerprint: &str) -> AssetResult<bool> {
        Err(AssetError::StoreUnavailable {
            source: sqlx::Error::PoolTimedOut,
        })
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        limit: usize,
        tag: Option<&str>,
    ) -> AssetResult<Vec<ScoredAsset>> {
        self.inner.similarity_search(query, limit, tag).await
    }

    async fn count(&self) -> AssetResult<u64> {
        self.inner.count().await
    }
}
