//! Request/response value objects flowing through the asset cache.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Method, Url};

/// How the browser issued a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Full-page load.
    Navigate,
    /// Sub-resource fetch (images, scripts, XHR, ...).
    #[default]
    Subresource,
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Navigation or sub-resource.
    pub mode: RequestMode,
    /// Forwarded request headers.
    pub headers: Vec<(String, String)>,
    /// Request body, empty for GET.
    pub body: Bytes,
}

impl FetchRequest {
    /// Creates a GET sub-resource request.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            mode: RequestMode::Subresource,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a GET navigation request.
    #[must_use]
    pub fn navigate(url: Url) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    /// Returns the same request with an extra header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns true for full-page loads.
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Cache key: the URL without its fragment.
    #[must_use]
    pub fn cache_key(&self) -> String {
        cache_key_for(&self.url)
    }
}

/// Computes the cache key for a URL.
#[must_use]
pub fn cache_key_for(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

/// A captured HTTP response. The body is reference counted, so cloning is
/// how a response is both stored and returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Bytes,
}

impl AssetResponse {
    /// Creates a response without headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Returns the same response with an extra header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the `Content-Type` header if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// A stored response together with its key and storage time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Request URL the entry is keyed by.
    pub key: String,
    /// Captured response.
    pub response: AssetResponse,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(key: impl Into<String>, response: AssetResponse) -> Self {
        Self {
            key: key.into(),
            response,
            stored_at: Utc::now(),
        }
    }
}
