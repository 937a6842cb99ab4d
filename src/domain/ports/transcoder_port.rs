//! Port for image decode/resize/encode.

use crate::domain::entities::{EncodedImage, ImageOptions};
use crate::domain::errors::ProxyError;

/// CPU-bound image transcoding. Callers run it off the async executor.
pub trait TranscoderPort: Send + Sync {
    /// Decodes `source`, resizes it if requested and encodes it.
    ///
    /// # Errors
    /// Returns `ProxyError::Decode` or `ProxyError::Encode`.
    fn transcode(&self, source: &[u8], options: &ImageOptions) -> Result<EncodedImage, ProxyError>;
}
