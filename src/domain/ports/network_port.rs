//! Network port definition.

use async_trait::async_trait;

use crate::domain::entities::{AssetResponse, FetchRequest};
use crate::domain::errors::NetworkError;

/// Port for issuing HTTP requests. Like the browser's `fetch`, any answer
/// from the remote end (including 4xx/5xx) is `Ok`; `Err` means no response.
#[async_trait]
pub trait NetworkPort: Send + Sync {
    /// Performs the request.
    async fn fetch(&self, request: &FetchRequest) -> Result<AssetResponse, NetworkError>;
}
