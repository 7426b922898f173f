//! Tag-biased hybrid search.
//!
//! Two phases over the same collection:
//!
//! 1. **Tag-constrained**: nearest neighbors restricted to assets carrying
//!    the requested tag, marked `tag_match = true`. Skipped entirely when no
//!    tag filter is given.
//! 2. **Backfill**: when phase 1 comes up short of `top_k`, an unconstrained
//!    nearest-neighbor pass fills the remainder with unseen paths, marked
//!    `tag_match = false`.
//!
//! Tag filtering narrows relevance but must never starve the caller: with
//! enough assets in the corpus the result always reaches `top_k`, degrading
//! gracefully to pure similarity search. Ordering is deterministic for a
//! fixed index state (score descending, path ascending on ties).

use std::collections::HashSet;

use crate::error::AssetResult;
use crate::models::{ScoredAsset, SearchHit};
use crate::store::AssetStore;

/// Run a hybrid search against the index.
///
/// Returns at most `top_k` hits with no duplicate paths. `top_k <= 0` yields
/// an empty result, as does an empty index.
pub async fn search(
    store: &dyn AssetStore,
    query_vector: &[f32],
    top_k: i64,
    tag_filter: &str,
) -> AssetResult<Vec<SearchHit>> {
    if top_k <= 0 {
        return Ok(Vec::new());
    }
    let top_k = top_k as usize;

    let tag = tag_filter.trim();
    let tagged = if tag.is_empty() {
        Vec::new()
    } else {
        store
            .similarity_search(query_vector, top_k, Some(tag))
            .await?
    };

    if tagged.len() >= top_k {
        return Ok(merge_backfill(tagged, Vec::new(), top_k));
    }

    // Request enough unconstrained candidates that, even if every
    // tag-matched path ranks ahead of the rest, top_k unseen ones remain.
    let fallback = store
        .similarity_search(query_vector, top_k + tagged.len(), None)
        .await?;

    Ok(merge_backfill(tagged, fallback, top_k))
}

/// Merge the tag-constrained results with unconstrained backfill candidates.
///
/// Pure function: tag-phase hits come first (already ranked), then fallback
/// candidates whose path has not been seen, in their own rank order, until
/// `top_k` is reached or candidates run out.
fn merge_backfill(
    tagged: Vec<ScoredAsset>,
    fallback: Vec<ScoredAsset>,
    top_k: usize,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = tagged
        .into_iter()
        .take(top_k)
        .map(|asset| SearchHit {
            path: asset.path,
            tags: asset.tags,
            tag_match: true,
        })
        .collect();

    let seen: HashSet<String> = hits.iter().map(|h| h.path.clone()).collect();

    hits.extend(
        fallback
            .into_iter()
            .filter(|asset| !seen.contains(&asset.path))
            .take(top_k - hits.len())
            .map(|asset| SearchHit {
                path: asset.path,
                tags: asset.tags,
                tag_match: false,
            }),
    );

    hits
}
