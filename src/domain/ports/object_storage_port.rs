//! Object storage port definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::NetworkError;

/// Port for downloading objects from the storage backend.
#[async_trait]
pub trait ObjectStoragePort: Send + Sync {
    /// Downloads `path` from `bucket`.
    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, NetworkError>;
}
