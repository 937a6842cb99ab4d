//! Port definition for named, versioned cache stores.

use async_trait::async_trait;

use crate::domain::entities::{AssetResponse, CacheEntry};
use crate::domain::errors::CacheResult;

/// Port for a collection of named request/response stores.
/// Implementations must be thread-safe; writes to the same key are
/// last-write-wins.
#[async_trait]
pub trait CacheStoragePort: Send + Sync {
    /// Creates the named store if it does not exist.
    async fn open(&self, cache: &str) -> CacheResult<()>;

    /// Looks up an entry. Returns None if the store or key is absent.
    async fn lookup(&self, cache: &str, key: &str) -> CacheResult<Option<CacheEntry>>;

    /// Stores a response under `key`, replacing any previous entry.
    async fn put(&self, cache: &str, key: &str, response: AssetResponse) -> CacheResult<()>;

    /// Removes one entry. Returns true if it existed.
    async fn evict(&self, cache: &str, key: &str) -> CacheResult<bool>;

    /// Names of all existing stores.
    async fn cache_names(&self) -> CacheResult<Vec<String>>;

    /// Deletes a whole store. Returns true if it existed.
    async fn delete_cache(&self, cache: &str) -> CacheResult<bool>;

    /// Returns true if the named store exists.
    async fn has_cache(&self, cache: &str) -> CacheResult<bool> {
        Ok(self.cache_names().await?.iter().any(|name| name == cache))
    }
}
