//! Domain types for image optimization requests.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ProxyError;

/// Default encoder quality.
pub const DEFAULT_QUALITY: u8 = 80;

/// Largest width or height the proxy will produce.
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;

/// Output encodings supported by the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// WebP (lossless encoder).
    #[default]
    Webp,
    /// AVIF.
    Avif,
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
}

impl OutputFormat {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// MIME type sent as `Content-Type`.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webp" => Ok(Self::Webp),
            "avif" => Ok(Self::Avif),
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            other => Err(ProxyError::invalid("format", format!("unsupported format '{other}'"))),
        }
    }
}

/// Resize and encode options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// Target width.
    pub width: Option<u32>,
    /// Target height.
    pub height: Option<u32>,
    /// Encoder quality, 1-100.
    pub quality: u8,
    /// Output encoding.
    pub format: OutputFormat,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            quality: DEFAULT_QUALITY,
            format: OutputFormat::default(),
        }
    }
}

impl ImageOptions {
    /// Sets the target width.
    #[must_use]
    pub const fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Sets the target height.
    #[must_use]
    pub const fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Sets the quality.
    #[must_use]
    pub const fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub const fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Returns true when a resize was requested.
    #[must_use]
    pub const fn resizes(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

/// Where the original bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Plain HTTP(S) download.
    Remote(Url),
    /// Object in the storage backend.
    Storage {
        /// Bucket name.
        bucket: String,
        /// Object path inside the bucket.
        path: String,
    },
}

impl ImageSource {
    /// Parses the `url` parameter. Values starting with `storage_prefix` are
    /// `<bucket>/<path>` references into object storage.
    ///
    /// # Errors
    /// Returns `ProxyError` when the value is empty, not an http(s) URL, or a
    /// storage reference without both bucket and path.
    pub fn parse(raw: &str, storage_prefix: &str) -> Result<Self, ProxyError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ProxyError::MissingUrl);
        }

        if !storage_prefix.is_empty()
            && let Some(rest) = raw.strip_prefix(storage_prefix)
        {
            let rest = rest.trim_start_matches('/');
            let Some((bucket, path)) = rest.split_once('/') else {
                return Err(ProxyError::invalid("url", "storage path needs a bucket and an object path"));
            };
            if bucket.is_empty() || path.is_empty() {
                return Err(ProxyError::invalid("url", "storage path needs a bucket and an object path"));
            }
            return Ok(Self::Storage {
                bucket: bucket.to_string(),
                path: path.to_string(),
            });
        }

        let url = Url::parse(raw).map_err(|e| ProxyError::invalid("url", e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Remote(url)),
            scheme => Err(ProxyError::invalid("url", format!("unsupported scheme '{scheme}'"))),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Storage { bucket, path } => write!(f, "storage:{bucket}/{path}"),
        }
    }
}

/// A validated optimization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizeRequest {
    /// Original image location.
    pub source: ImageSource,
    /// Resize and encode options.
    pub options: ImageOptions,
}

impl OptimizeRequest {
    /// Validates raw query parameters. Runs before any I/O.
    ///
    /// # Errors
    /// `ProxyError::MissingUrl` when `url` is absent or empty, otherwise
    /// `ProxyError::InvalidParameter` for the first malformed value.
    pub fn from_query(
        params: &HashMap<String, String>,
        storage_prefix: &str,
        max_dimension: u32,
    ) -> Result<Self, ProxyError> {
        let raw_url = params.get("url").map(String::as_str).unwrap_or_default();
        if raw_url.trim().is_empty() {
            return Err(ProxyError::MissingUrl);
        }
        let source = ImageSource::parse(raw_url, storage_prefix)?;

        let width = parse_dimension(params, "width", max_dimension)?;
        let height = parse_dimension(params, "height", max_dimension)?;

        let quality = match non_empty(params, "quality") {
            None => DEFAULT_QUALITY,
            Some(raw) => match raw.parse::<u8>() {
                Ok(q) if (1..=100).contains(&q) => q,
                _ => return Err(ProxyError::invalid("quality", "must be an integer between 1 and 100")),
            },
        };

        let format = non_empty(params, "format")
            .map(str::parse::<OutputFormat>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            source,
            options: ImageOptions {
                width,
                height,
                quality,
                format,
            },
        })
    }
}

fn non_empty<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_dimension(
    params: &HashMap<String, String>,
    name: &'static str,
    max: u32,
) -> Result<Option<u32>, ProxyError> {
    let Some(raw) = non_empty(params, name) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(ProxyError::invalid(name, "must be a positive integer")),
        Ok(v) if v > max => Err(ProxyError::invalid(name, format!("must not exceed {max}"))),
        Ok(v) => Ok(Some(v)),
    }
}

/// Transcoded image bytes.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Encoded payload.
    pub bytes: Bytes,
    /// Encoding used.
    pub format: OutputFormat,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
}
