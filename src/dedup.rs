//! Content-addressed deduplication.
//!
//! Every upload is identified by the SHA-256 digest of its raw bytes. The
//! digest is computed once at ingestion and stored on the record; duplicate
//! detection is an exact-match lookup against the index, never a similarity
//! query.

use sha2::{Digest, Sha256};

use crate::error::AssetResult;
use crate::store::AssetStore;

/// Compute the content fingerprint of an uploaded payload.
///
/// Deterministic and collision-resistant: the same bytes always produce the
/// same fingerprint, and distinct bytes collide only with cryptographically
/// negligible probability.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Check whether content with this fingerprint is already indexed.
///
/// Errors from the store propagate unchanged — an unreachable index must not
/// be mistaken for "not a duplicate".
pub async fn exists(store: &dyn AssetStore, fingerprint: &str) -> AssetResult<bool> {
    store.fingerprint_exists(fingerprint).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let data = b"the same bytes";
        assert_eq!(fingerprint(data), fingerprint(data));
    }

    #[test]
    fn test_fingerprint_distinguishes_content() {
        assert_ne!(fingerprint(b"payload one"), fingerprint(b"payload two"));
        // One-byte difference is enough
        assert_ne!(fingerprint(b"payload"), fingerprint(b"paxload"));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = fingerprint(b"");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        // Well-known digest of the empty input
        assert_eq!(
            fp,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
