//! Error taxonomy for the asset index pipeline.
//!
//! Every variant carries an actionable message. A duplicate upload is not an
//! error (it is a skip outcome in the ingest report), and deleting or
//! re-tagging a path that does not exist is a no-op success, so neither
//! appears here.

/// Unified error type for the embedding gateway, asset storage, and the
/// vector index.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The embedding service could not produce a vector (network error,
    /// non-retryable HTTP status, or retries exhausted).
    #[error("embedding service unavailable: {reason}. Check [embedding].endpoint and that the inference server is running.")]
    EmbeddingUnavailable {
        /// Why the gateway call failed.
        reason: String,
    },

    /// Reading, writing, or deleting asset bytes on disk failed.
    #[error("asset storage failure at {path}: {source}")]
    Storage {
        /// The file the operation targeted.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The vector index could not be reached or a query against it failed.
    #[error("vector store unavailable: {source}. Run `latent init` and check [db].path.")]
    StoreUnavailable {
        /// The underlying database error.
        #[source]
        source: sqlx::Error,
    },

    /// A vector's length does not match the collection dimension.
    #[error("dimension mismatch: collection is {expected}-dim, got {found}-dim. The embedding model and [embedding].dims must agree.")]
    InvalidDimension {
        /// Dimension the collection was created with.
        expected: usize,
        /// Dimension of the offending vector.
        found: usize,
    },
}

impl From<sqlx::Error> for AssetError {
    fn from(source: sqlx::Error) -> Self {
        AssetError::StoreUnavailable { source }
    }
}

/// Convenience alias used throughout the core modules.
pub type AssetResult<T> = std::result::Result<T, AssetError>;
