//! `/api/optimize-image` handler.

use std::collections::HashMap;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{Method, header},
    response::{IntoResponse, Response},
};

use crate::domain::errors::ProxyError;
use crate::presentation::http::error::{ApiError, ApiResult};
use crate::presentation::http::state::AppState;

/// Cache policy for optimized images: 30 days, then revalidate in the
/// background for a day.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=2592000, stale-while-revalidate=86400";

/// Fetches, resizes and re-encodes an image. GET only.
///
/// # Errors
/// 405 for other methods, checked before the query is looked at. 400 for
/// bad parameters, 500 for any fetch or transcoding failure.
pub async fn optimize_image(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ApiResult<Response> {
    if method != Method::GET {
        return Err(ProxyError::MethodNotAllowed(method.to_string()).into());
    }
    let Query(params) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let request = state.optimizer.parse(&params)?;
    let image = state.optimizer.execute(&request).await?;

    Ok((
        [
            (header::CONTENT_TYPE, image.format.content_type()),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL),
        ],
        image.bytes,
    )
        .into_response())
}
