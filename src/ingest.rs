//! Ingestion orchestration.
//!
//! Coordinates the upload flow for a batch: dedup → persist bytes → embed →
//! one batched index upsert. Items are processed in input order and isolated
//! from each other's dedup/embedding failures; only a storage write failure
//! aborts the whole request, because nothing may be indexed without its bytes
//! durably persisted.

use uuid::Uuid;

use crate::dedup;
use crate::embedding::Embedder;
use crate::error::AssetResult;
use crate::models::{AssetRecord, IngestFailure, IngestReport, Upload};
use crate::storage::AssetStorage;
use crate::store::AssetStore;

/// Parse a comma-separated tag string into trimmed, non-empty tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Ingest a batch of uploads sharing one tag string.
///
/// Returns the per-item accept/skip/failure report. Ids are fresh UUIDs per
/// record, so concurrent batches cannot collide and ids are never reused.
pub async fn ingest_batch(
    store: &dyn AssetStore,
    embedder: &dyn Embedder,
    storage: &AssetStorage,
    uploads: &[Upload],
    tags_raw: &str,
) -> AssetResult<IngestReport> {
    let tags = parse_tags(tags_raw);

    let mut accepted: Vec<AssetRecord> = Vec::new();
    let mut report = IngestReport::default();

    for upload in uploads {
        let fingerprint = dedup::fingerprint(&upload.bytes);

        // An unreachable index is a per-item failure, never "not a duplicate".
        match dedup::exists(store, &fingerprint).await {
            Ok(true) => {
                report.skipped += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                report.failures.push(IngestFailure {
                    filename: upload.filename.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        }

        // Bytes must be durable before the vector exists anywhere; a write
        // failure is fatal for the whole request.
        let path = storage.write(&upload.filename, &upload.bytes)?;

        let vector = match embedder.embed_image(&upload.filename, &upload.bytes).await {
            Ok(vector) => vector,
            Err(e) => {
                report.failures.push(IngestFailure {
                    filename: upload.filename.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        accepted.push(AssetRecord {
            id: Uuid::new_v4().to_string(),
            vector,
            path,
            tags: tags.clone(),
            fingerprint,
        });
    }

    if !accepted.is_empty() {
        report.added = accepted.len();
        store.upsert(&accepted).await?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_trims_and_drops_empty() {
        assert_eq!(
            parse_tags(" cat , dog ,, bird,"),
            vec!["cat".to_string(), "dog".to_string(), "bird".to_string()]
        );
    }

    #[test]
    fn test_parse_tags_empty_string() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags("  , ,").is_empty());
    }

    #[test]
    fn test_parse_tags_keeps_duplicates() {
        assert_eq!(parse_tags("cat,cat"), vec!["cat", "cat"]);
    }
}
