//! Domain error types.

mod cache_error;
mod network_error;
mod proxy_error;
mod storage_error;

pub use cache_error::{AssetCacheError, CacheError, CacheResult};
pub use network_error::NetworkError;
pub use proxy_error::ProxyError;
pub use storage_error::StorageError;
