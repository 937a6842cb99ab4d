//! Image optimization use case.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::domain::entities::{
    DEFAULT_MAX_DIMENSION, EncodedImage, FetchRequest, ImageSource, OptimizeRequest,
};
use crate::domain::errors::{NetworkError, ProxyError};
use crate::domain::ports::{NetworkPort, ObjectStoragePort, TranscoderPort};

/// Default prefix marking `url` values that live in object storage.
pub const DEFAULT_STORAGE_PREFIX: &str = "supabase://";

/// Fetches an original image, then resizes and re-encodes it.
#[derive(Clone)]
pub struct OptimizeImageUseCase {
    network: Arc<dyn NetworkPort>,
    storage: Arc<dyn ObjectStoragePort>,
    transcoder: Arc<dyn TranscoderPort>,
    storage_prefix: String,
    max_dimension: u32,
}

impl OptimizeImageUseCase {
    /// Creates the use case with default limits.
    #[must_use]
    pub fn new(
        network: Arc<dyn NetworkPort>,
        storage: Arc<dyn ObjectStoragePort>,
        transcoder: Arc<dyn TranscoderPort>,
    ) -> Self {
        Self {
            network,
            storage,
            transcoder,
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    /// Overrides the storage prefix.
    #[must_use]
    pub fn with_storage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = prefix.into();
        self
    }

    /// Overrides the largest accepted width or height.
    #[must_use]
    pub const fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = max;
        self
    }

    /// Validates query parameters without touching the network.
    ///
    /// # Errors
    /// Returns a client error for missing or malformed parameters.
    pub fn parse(&self, params: &HashMap<String, String>) -> Result<OptimizeRequest, ProxyError> {
        OptimizeRequest::from_query(params, &self.storage_prefix, self.max_dimension)
    }

    /// Runs the optimization.
    ///
    /// # Errors
    /// Returns `ProxyError::Source` if the original cannot be fetched, or a
    /// decode/encode error from the transcoder.
    pub async fn execute(&self, request: &OptimizeRequest) -> Result<EncodedImage, ProxyError> {
        let started = Instant::now();
        let original = self.fetch_source(&request.source).await.inspect_err(|e| {
            warn!(source = %request.source, error = %e, "Failed to fetch source image");
        })?;
        debug!(source = %request.source, bytes = original.len(), "Fetched source image");

        let transcoder = self.transcoder.clone();
        let options = request.options;
        let encoded = tokio::task::spawn_blocking(move || transcoder.transcode(&original, &options))
            .await
            .map_err(|e| ProxyError::decode(format!("transcode task panicked: {e}")))?
            .inspect_err(|e| warn!(source = %request.source, error = %e, "Transcoding failed"))?;

        info!(
            source = %request.source,
            format = %encoded.format,
            width = encoded.width,
            height = encoded.height,
            bytes = encoded.bytes.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Optimized image"
        );
        Ok(encoded)
    }

    async fn fetch_source(&self, source: &ImageSource) -> Result<Bytes, NetworkError> {
        match source {
            ImageSource::Storage { bucket, path } => self.storage.download(bucket, path).await,
            ImageSource::Remote(url) => {
                let response = self.network.fetch(&FetchRequest::get(url.clone())).await?;
                if !response.is_success() {
                    return Err(NetworkError::Status {
                        status: response.status,
                        url: url.to_string(),
                    });
                }
                Ok(response.body)
            }
        }
    }
}
