//! SQLite backend behavior: schema idempotency, dimension pinning, and
//! parity with the store contract.

use latent_assets::error::AssetError;
use latent_assets::models::AssetRecord;
use latent_assets::store::{AssetStore, SqliteStore};

const DIMS: usize = 4;

fn record(id: &str, path: &str, vector: Vec<f32>, tags: &[&str], fingerprint: &str) -> AssetRecord {
    AssetRecord {
        id: id.to_string(),
        vector,
        path: path.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        fingerprint: fingerprint.to_string(),
    }
}

async fn open_store(tmp: &tempfile::TempDir) -> SqliteStore {
    let store = SqliteStore::open(&tmp.path().join("data").join("latent.sqlite"), DIMS)
        .await
        .unwrap();
    store.ensure_collection().await.unwrap();
    store
}

#[tokio::test]
async fn test_ensure_collection_idempotent() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    // Safe to call on every start.
    store.ensure_collection().await.unwrap();
    store.ensure_collection().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
    store.close().await;
}

#[tokio::test]
async fn test_dimension_is_pinned_at_creation() {
    let tmp = tempfile::TempDir::new().unwrap();
    let db_path = tmp.path().join("data").join("latent.sqlite");

    let store = SqliteStore::open(&db_path, DIMS).await.unwrap();
    store.ensure_collection().await.unwrap();
    store.close().await;

    // Reopening with a different dimension must fail, not silently migrate.
    let wrong = SqliteStore::open(&db_path, DIMS + 1).await.unwrap();
    let err = wrong.ensure_collection().await.unwrap_err();
    assert!(matches!(err, AssetError::InvalidDimension { .. }));
    wrong.close().await;
}

#[tokio::test]
async fn test_upsert_rejects_wrong_dimension_at_boundary() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let bad = record("id-1", "a.jpg", vec![1.0, 0.0], &[], "fp-1");
    let err = store.upsert(&[bad]).await.unwrap_err();
    assert!(matches!(
        err,
        AssetError::InvalidDimension {
            expected: DIMS,
            found: 2
        }
    ));
    assert_eq!(store.count().await.unwrap(), 0);
    store.close().await;
}

#[tokio::test]
async fn test_upsert_overwrites_on_id_collision() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let original = record("id-1", "a.jpg", vec![1.0, 0.0, 0.0, 0.0], &["old"], "fp-a");
    store.upsert(&[original]).await.unwrap();

    let replacement = record("id-1", "b.jpg", vec![0.0, 1.0, 0.0, 0.0], &["new"], "fp-b");
    store.upsert(&[replacement]).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    let hits = store
        .similarity_search(&[0.0, 1.0, 0.0, 0.0], 1, None)
        .await
        .unwrap();
    assert_eq!(hits[0].path, "b.jpg");
    assert_eq!(hits[0].tags, vec!["new".to_string()]);
    store.close().await;
}

#[tokio::test]
async fn test_fingerprint_exact_match_lookup() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let rec = record("id-1", "a.jpg", vec![1.0, 0.0, 0.0, 0.0], &[], "fp-present");
    store.upsert(&[rec]).await.unwrap();

    assert!(store.fingerprint_exists("fp-present").await.unwrap());
    assert!(!store.fingerprint_exists("fp-absent").await.unwrap());
    // Prefix is not a match; the filter is exact.
    assert!(!store.fingerprint_exists("fp-pres").await.unwrap());
    store.close().await;
}

#[tokio::test]
async fn test_delete_update_and_tag_filtered_search() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    store
        .upsert(&[
            record("id-1", "a.jpg", vec![1.0, 0.0, 0.0, 0.0], &["cat"], "fp-a"),
            record("id-2", "b.jpg", vec![0.9, 0.1, 0.0, 0.0], &["dog"], "fp-b"),
            record("id-3", "c.jpg", vec![0.0, 1.0, 0.0, 0.0], &["cat"], "fp-c"),
        ])
        .await
        .unwrap();

    let cats = store
        .similarity_search(&[1.0, 0.0, 0.0, 0.0], 10, Some("cat"))
        .await
        .unwrap();
    assert_eq!(
        cats.iter().map(|c| c.path.as_str()).collect::<Vec<_>>(),
        vec!["a.jpg", "c.jpg"]
    );

    assert!(store.update_tags("b.jpg", &["cat".to_string()]).await.unwrap());
    let cats = store
        .similarity_search(&[1.0, 0.0, 0.0, 0.0], 10, Some("cat"))
        .await
        .unwrap();
    assert_eq!(cats.len(), 3);

    assert_eq!(store.delete_by_path("a.jpg").await.unwrap(), 1);
    assert_eq!(store.delete_by_path("a.jpg").await.unwrap(), 0);
    let remaining = store
        .similarity_search(&[1.0, 0.0, 0.0, 0.0], 10, None)
        .await
        .unwrap();
    assert!(remaining.iter().all(|r| r.path != "a.jpg"));
    store.close().await;
}
