//! Image proxy error types.

use thiserror::Error;

use super::NetworkError;

/// Errors raised while serving an optimization request.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ProxyError {
    #[error("missing url parameter")]
    MissingUrl,

    #[error("invalid {name} parameter: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("failed to fetch source image: {0}")]
    Source(#[from] NetworkError),

    #[error("failed to decode image: {message}")]
    Decode { message: String },

    #[error("failed to encode image: {message}")]
    Encode { message: String },
}

impl ProxyError {
    /// Creates invalid parameter error.
    #[must_use]
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates encode error.
    #[must_use]
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Returns whether the caller sent a bad request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingUrl | Self::InvalidParameter { .. } | Self::MethodNotAllowed(_)
        )
    }
}
