//! Durable [`AssetStore`] backed by SQLite via `sqlx`.
//!
//! Embeddings are stored as little-endian f32 BLOBs and similarity is
//! computed in Rust over the scanned collection; exact-match lookups (path,
//! fingerprint) are plain SQL filters. The collection dimension is recorded
//! in a metadata table at creation time and verified on every start, so a
//! model change cannot silently mix dimensions within one collection.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::{AssetError, AssetResult};
use crate::models::{AssetRecord, ScoredAsset};

use super::AssetStore;

/// SQLite-backed asset index. Holds the process-wide connection pool; share
/// it across handlers behind an `Arc` rather than opening per request.
pub struct SqliteStore {
    pool: SqlitePool,
    dims: usize,
}

impl SqliteStore {
    /// Open (creating if missing) the database file and build the pool.
    pub async fn open(db_path: &Path, dims: usize) -> AssetResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| AssetError::Storage {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(AssetError::from)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool, dims })
    }

    /// Wrap an existing pool (used by tests that manage their own file).
    pub fn with_pool(pool: SqlitePool, dims: usize) -> Self {
        Self { pool, dims }
    }

    pub async fn close(&self) {
        self.pool.close().await;
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

fn tags_to_json(tags: &[String]) -> String {
    serde_json::Value::from(tags.to_vec()).to_string()
}

fn tags_from_json(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[async_trait]
impl AssetStore for SqliteStore {
    async fn ensure_collection(&self) -> AssetResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS assets (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                fingerprint TEXT NOT NULL,
                embedding BLOB NOT NULL,
                indexed_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collection_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_assets_path ON assets(path)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_assets_fingerprint ON assets(fingerprint)")
            .execute(&self.pool)
            .await?;

        // The dimension is fixed at creation; changing it requires a full
        // reindex, so a mismatch on start is an error rather than a migration.
        let stored: Option<String> =
            sqlx::query_scalar("SELECT value FROM collection_meta WHERE key = 'dims'")
                .fetch_optional(&self.pool)
                .await?;

        match stored.and_then(|s| s.parse::<usize>().ok()) {
            Some(existing) if existing != self.dims => Err(AssetError::InvalidDimension {
                expected: existing,
                found: self.dims,
            }),
            Some(_) => Ok(()),
            None => {
                sqlx::query("INSERT OR IGNORE INTO collection_meta (key, value) VALUES ('dims', ?)")
                    .bind(self.dims.to_string())
                    .execute(&self.pool)
                    .await?;
                Ok(())
            }
        }
    }

    async fn upsert(&self, records: &[AssetRecord]) -> AssetResult<()> {
        for record in records {
            self.check_dims(record.vector.len())?;
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO assets (id, path, tags, fingerprint, embedding, indexed_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    path = excluded.path,
                    tags = excluded.tags,
                    fingerprint = excluded.fingerprint,
                    embedding = excluded.embedding,
                    indexed_at = excluded.indexed_at
                "#,
            )
            .bind(&record.id)
            .bind(&record.path)
            .bind(tags_to_json(&record.tags))
            .bind(&record.fingerprint)
            .bind(vec_to_blob(&record.vector))
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_by_path(&self, path: &str) -> AssetResult<u64> {
        let result = sqlx::query("DELETE FROM assets WHERE path = ?")
            .bind(path)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn update_tags(&self, path: &str, tags: &[String]) -> AssetResult<bool> {
        let result = sqlx::query("UPDATE assets SET tags = ? WHERE path = ?")
            .bind(tags_to_json(tags))
            .bind(path)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn fingerprint_exists(&self, fingerprint: &str) -> AssetResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM assets WHERE fingerprint = ?")
                .bind(fingerprint)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
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

        let rows = sqlx::query("SELECT path, tags, embedding FROM assets")
            .fetch_all(&self.pool)
            .await?;

        let mut candidates: Vec<ScoredAsset> = rows
            .iter()
            .filter_map(|row| {
                let tags = tags_from_json(row.get("tags"));
                if let Some(t) = tag {
                    if !tags.iter().any(|x| x == t) {
                        return None;
                    }
                }
                let blob: Vec<u8> = row.get("embedding");
                let vector = blob_to_vec(&blob);
                Some(ScoredAsset {
                    path: row.get("path"),
                    tags,
                    score: cosine_similarity(query, &vector),
                })
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
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
