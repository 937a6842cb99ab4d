//! Network error types.

use thiserror::Error;

/// Failures reaching the origin, a remote host, or the storage backend.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum NetworkError {
    #[error("request to {url} failed: {message}")]
    RequestFailed { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("failed to read response body: {message}")]
    Body { message: String },

    #[error("object not found: {path}")]
    NotFound { path: String },

    #[error("object storage is not configured")]
    NotConfigured,

    #[error("failed to create HTTP client: {message}")]
    Client { message: String },
}

impl NetworkError {
    /// Creates request failed error.
    #[must_use]
    pub fn request_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates body read error.
    #[must_use]
    pub fn body(message: impl Into<String>) -> Self {
        Self::Body {
            message: message.into(),
        }
    }

    /// Returns whether the remote end was unreachable, as opposed to having
    /// answered with an error.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::RequestFailed { .. } | Self::Body { .. })
    }
}
