//! Named cache store backends.
//!
//! - In-memory LRU stores
//! - Disk stores for persistence across restarts

pub mod disk_cache;
pub mod memory_cache;

pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DiskCacheStorage};
pub use memory_cache::{CacheStats, DEFAULT_CACHE_SIZE, MemoryCacheStorage};
