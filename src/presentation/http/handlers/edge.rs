//! Fallback handler forwarding everything else to the origin through the
//! asset cache.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::Response,
};
use reqwest::Url;
use tracing::{debug, warn};

use crate::application::services::FetchOutcome;
use crate::domain::entities::{AssetResponse, FetchRequest, RequestMode};
use crate::infrastructure::http::is_hop_by_hop;
use crate::presentation::http::error::{ApiError, ApiResult};
use crate::presentation::http::state::AppState;

const MAX_FORWARDED_BODY: usize = 10 * 1024 * 1024;

/// Dispatches a request through the asset cache, or straight to the origin
/// when the cache passes it through.
///
/// # Errors
/// 404 without edge mode, 400 for requests that leave the origin, 502 when
/// the origin is down and nothing can be served.
pub async fn edge(State(state): State<AppState>, request: Request) -> ApiResult<Response> {
    let Some(edge) = state.edge else {
        return Err(ApiError::NotFound);
    };

    let fetch = to_fetch_request(&edge.origin, request).await?;
    let response = match edge.cache.handle_fetch(&fetch).await? {
        FetchOutcome::Respond { response, source } => {
            debug!(url = %fetch.url, ?source, "Served by asset cache");
            response
        }
        FetchOutcome::PassThrough => edge.network.fetch(&fetch).await?,
    };

    into_response(response)
}

async fn to_fetch_request(origin: &Url, request: Request) -> ApiResult<FetchRequest> {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or("/", axum::http::uri::PathAndQuery::as_str);
    let url = origin
        .join(path_and_query)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if url.origin() != origin.origin() {
        warn!(%url, "Rejected request leaving the origin");
        return Err(ApiError::BadRequest("cross-origin path".to_string()));
    }

    let body = to_bytes(body, MAX_FORWARDED_BODY)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(FetchRequest {
        mode: request_mode(&parts.method, &parts.headers),
        method: parts.method,
        url,
        headers: forwarded_headers(&parts.headers),
        body,
    })
}

fn request_mode(method: &Method, headers: &HeaderMap) -> RequestMode {
    let header_value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if header_value("sec-fetch-mode") == Some("navigate") {
        return RequestMode::Navigate;
    }
    if method == Method::GET
        && header_value(header::ACCEPT.as_str()).is_some_and(|accept| accept.contains("text/html"))
    {
        return RequestMode::Navigate;
    }
    RequestMode::Subresource
}

fn forwarded_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn into_response(response: AssetResponse) -> ApiResult<Response> {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);
    for (name, value) in &response.headers {
        if !is_hop_by_hop(name) {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    builder
        .body(Body::from(response.body))
        .map_err(|e| ApiError::BadGateway(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_detection() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_mode(&Method::GET, &headers), RequestMode::Subresource);

        headers.insert(header::ACCEPT, "text/html,application/xhtml+xml".parse().unwrap());
        assert_eq!(request_mode(&Method::GET, &headers), RequestMode::Navigate);
        assert_eq!(request_mode(&Method::POST, &headers), RequestMode::Subresource);

        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-mode", "navigate".parse().unwrap());
        assert_eq!(request_mode(&Method::POST, &headers), RequestMode::Navigate);
    }

    #[test]
    fn test_forwarded_headers_drop_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());
        headers.insert(header::ACCEPT_LANGUAGE, "bg".parse().unwrap());

        let forwarded = forwarded_headers(&headers);
        assert_eq!(forwarded, vec![("accept-language".to_string(), "bg".to_string())]);
    }
}
