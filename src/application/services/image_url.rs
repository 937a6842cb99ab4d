//! Optimized image URL builder.
//!
//! Maps a source path or URL plus [`ImageOptions`] to a request against the
//! image proxy. The proxy runs server-side, so site-local sources are made
//! absolute against the configured site URL before being embedded.

use url::form_urlencoded;

use crate::domain::entities::ImageOptions;

/// Path of the image optimization endpoint.
pub const OPTIMIZE_ENDPOINT: &str = "/api/optimize-image";

/// Builds deterministic proxy URLs.
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    site_url: String,
    storage_prefix: String,
}

impl ImageUrlBuilder {
    /// Creates a builder for the given site base URL.
    #[must_use]
    pub fn new(site_url: impl Into<String>, storage_prefix: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into().trim_end_matches('/').to_string(),
            storage_prefix: storage_prefix.into(),
        }
    }

    /// Returns the site base URL without a trailing slash.
    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Builds the proxy URL for `src`.
    ///
    /// Empty input yields an empty string. SVG and `data:` sources are
    /// returned unchanged.
    #[must_use]
    pub fn build(&self, src: &str, options: &ImageOptions) -> String {
        let src = src.trim();
        if src.is_empty() {
            return String::new();
        }
        if is_passthrough_source(src) {
            return src.to_string();
        }

        let absolute = self.absolutize(src);
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("url", &absolute);
        if let Some(width) = options.width {
            query.append_pair("width", &width.to_string());
        }
        if let Some(height) = options.height {
            query.append_pair("height", &height.to_string());
        }
        query.append_pair("quality", &options.quality.to_string());
        query.append_pair("format", options.format.as_str());

        format!("{OPTIMIZE_ENDPOINT}?{}", query.finish())
    }

    /// Expands site-local sources to absolute URLs. Absolute and
    /// storage-prefixed sources are returned as-is; protocol-relative ones
    /// get `https:`.
    #[must_use]
    pub fn absolutize(&self, src: &str) -> String {
        let lower = src.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return src.to_string();
        }
        if !self.storage_prefix.is_empty() && src.starts_with(&self.storage_prefix) {
            return src.to_string();
        }
        if let Some(rest) = src.strip_prefix("//") {
            return format!("https://{rest}");
        }
        if src.starts_with('/') {
            format!("{}{src}", self.site_url)
        } else {
            format!("{}/{}", self.site_url, src.trim_start_matches("./"))
        }
    }
}

/// Returns true for sources that are never transcoded: SVG files and
/// `data:` URLs.
#[must_use]
pub fn is_passthrough_source(src: &str) -> bool {
    if src.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:")) {
        return true;
    }
    let path = src.split(['?', '#']).next().unwrap_or(src);
    path.to_ascii_lowercase().ends_with(".svg")
}
