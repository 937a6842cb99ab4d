//! API error types and their HTTP mapping.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::domain::errors::{AssetCacheError, NetworkError, ProxyError};

/// Body sent for every optimization failure that is not the caller's fault.
pub const OPTIMIZE_FAILED: &str = "Failed to optimize image";

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Image proxy failure.
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    /// Origin unreachable and nothing cached.
    #[error(transparent)]
    AssetCache(#[from] AssetCacheError),

    /// Origin unreachable on a pass-through request.
    #[error(transparent)]
    Upstream(#[from] NetworkError),

    /// Origin answered with something that cannot be relayed.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Request cannot be forwarded.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// No route and edge mode is off.
    #[error("Not found")]
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Proxy(ProxyError::MethodNotAllowed(method)) => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "GET")],
                Json(json!({ "error": format!("Method {method} not allowed") })),
            )
                .into_response(),
            Self::Proxy(ProxyError::MissingUrl) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing url parameter" })),
            )
                .into_response(),
            Self::Proxy(e) if e.is_client_error() => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
            }
            Self::Proxy(e) => {
                error!(error = %e, "Image optimization failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": OPTIMIZE_FAILED })),
                )
                    .into_response()
            }
            Self::AssetCache(e) => {
                error!(error = %e, "Edge request failed with no fallback");
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": "Origin unavailable" }))).into_response()
            }
            Self::Upstream(e) => {
                error!(error = %e, "Pass-through request failed");
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": "Origin unavailable" }))).into_response()
            }
            Self::BadGateway(message) => {
                error!(%message, "Cannot relay origin response");
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": "Origin unavailable" }))).into_response()
            }
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
            }
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
