//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{AssetResponse, CacheEntry, FetchRequest, ImageOptions, OutputFormat};
pub use errors::{AssetCacheError, CacheError, NetworkError, ProxyError, StorageError};
pub use ports::{CacheStoragePort, KeyValuePort, NetworkPort, ObjectStoragePort, TranscoderPort};
