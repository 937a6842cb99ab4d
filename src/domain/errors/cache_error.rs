//! Cache storage error types.

use thiserror::Error;

use super::NetworkError;

/// Result type for cache storage operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors from a named cache store.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Cache name cannot be used as a store identifier.
    #[error("Invalid cache name: {0}")]
    InvalidName(String),
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
    /// Stored entry metadata could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors from the asset cache lifecycle and fetch dispatch.
#[derive(Debug, Clone, Error)]
pub enum AssetCacheError {
    /// A precache manifest entry could not be fetched.
    #[error("precaching {url} failed: {reason}")]
    #[allow(missing_docs)]
    InstallFailed { url: String, reason: String },
    /// Network failure with no usable fallback.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// Cache storage failure during install or activation.
    #[error(transparent)]
    Cache(#[from] CacheError),
}
