//! In-memory named cache stores, each an LRU of captured responses.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::domain::entities::{AssetResponse, CacheEntry};
use crate::domain::errors::{CacheError, CacheResult};
use crate::domain::ports::CacheStoragePort;

/// Default maximum number of entries per store.
pub const DEFAULT_CACHE_SIZE: usize = 256;

/// In-memory cache stores. Thread-safe; lookups promote entries.
pub struct MemoryCacheStorage {
    stores: RwLock<HashMap<String, LruCache<String, CacheEntry>>>,
    capacity: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCacheStorage {
    /// Creates storage whose stores hold at most `capacity` entries each.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
            capacity: NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates storage with the default per-store capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }

    /// Total number of entries across all stores. Best effort while
    /// writers are active.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores
            .try_read()
            .map(|stores| stores.values().map(LruCache::len).sum())
            .unwrap_or(0)
    }

    /// Returns true if no entries are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns lookup statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: self.len(),
        }
    }
}

impl Default for MemoryCacheStorage {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached responses.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} responses, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

pub(super) fn validate_name(cache: &str) -> CacheResult<()> {
    if cache.is_empty()
        || cache.len() > 128
        || !cache
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        || cache.starts_with('.')
    {
        return Err(CacheError::InvalidName(cache.to_string()));
    }
    Ok(())
}

#[async_trait]
impl CacheStoragePort for MemoryCacheStorage {
    async fn open(&self, cache: &str) -> CacheResult<()> {
        validate_name(cache)?;
        let mut stores = self.stores.write().await;
        if !stores.contains_key(cache) {
            debug!(cache, "Opened memory cache store");
            stores.insert(cache.to_string(), LruCache::new(self.capacity));
        }
        Ok(())
    }

    async fn lookup(&self, cache: &str, key: &str) -> CacheResult<Option<CacheEntry>> {
        let mut stores = self.stores.write().await;
        let found = stores
            .get_mut(cache)
            .and_then(|store| store.get(key).cloned());
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(cache, key, "Memory cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(cache, key, "Memory cache miss");
        }
        Ok(found)
    }

    async fn put(&self, cache: &str, key: &str, response: AssetResponse) -> CacheResult<()> {
        validate_name(cache)?;
        let mut stores = self.stores.write().await;
        let store = stores
            .entry(cache.to_string())
            .or_insert_with(|| LruCache::new(self.capacity));
        debug!(cache, key, status = response.status, "Storing response in memory cache");
        store.put(key.to_string(), CacheEntry::new(key, response));
        Ok(())
    }

    async fn evict(&self, cache: &str, key: &str) -> CacheResult<bool> {
        let mut stores = self.stores.write().await;
        let removed = stores
            .get_mut(cache)
            .is_some_and(|store| store.pop(key).is_some());
        if removed {
            debug!(cache, key, "Evicted response from memory cache");
        }
        Ok(removed)
    }

    async fn cache_names(&self) -> CacheResult<Vec<String>> {
        let mut names: Vec<String> = self.stores.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_cache(&self, cache: &str) -> CacheResult<bool> {
        let removed = self.stores.write().await.remove(cache).is_some();
        if removed {
            debug!(cache, "Deleted memory cache store");
        }
        Ok(removed)
    }
}
