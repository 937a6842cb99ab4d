//! Infrastructure layer with external service adapters.

/// Named cache store backends.
pub mod cache;
/// Application configuration.
pub mod config;
/// Outbound HTTP and object storage.
pub mod http;
/// Image transcoding.
pub mod image;
/// Key/value storage backends.
pub mod local_storage;

pub use cache::{CacheStats, DiskCacheStorage, MemoryCacheStorage};
pub use config::{AppConfig, CliArgs, ConfigError, LogLevel, StorageManager};
pub use http::{HttpClient, SupabaseStorage, UnconfiguredStorage};
pub use image::ImageTranscoder;
pub use local_storage::{FileKeyValueStore, MemoryKeyValueStore};
