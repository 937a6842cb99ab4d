//! Outbound HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::domain::entities::{AssetResponse, FetchRequest};
use crate::domain::errors::NetworkError;
use crate::domain::ports::NetworkPort;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("inkwell/", env!("CARGO_PKG_VERSION"));

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Returns true for connection-scoped headers that must not be forwarded.
#[must_use]
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// `reqwest`-backed network port.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the given timeout.
    ///
    /// # Errors
    /// Returns error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::Client {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Returns the underlying client for adapters sharing its pool.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

pub(crate) fn map_send_error(url: &str, e: &reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::request_failed(url, "request timed out")
    } else if e.is_connect() {
        NetworkError::request_failed(url, "failed to connect")
    } else {
        NetworkError::request_failed(url, e.to_string())
    }
}

#[async_trait]
impl NetworkPort for HttpClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<AssetResponse, NetworkError> {
        let url = request.url.as_str();
        let mut builder = self.client.request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            if !is_hop_by_hop(name) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            warn!(url, error = %e, "Request failed");
            map_send_error(url, &e)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::body(e.to_string()))?;

        debug!(url, status, bytes = body.len(), "Fetched");
        Ok(AssetResponse {
            status,
            headers,
            body,
        })
    }
}
