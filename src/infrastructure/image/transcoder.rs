//! Image decode, resize and encode on top of the `image` crate.

use bytes::Bytes;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::trace;

use crate::domain::entities::{EncodedImage, ImageOptions, OutputFormat};
use crate::domain::errors::ProxyError;
use crate::domain::ports::TranscoderPort;

/// Default AVIF encoder speed (1 slowest, 10 fastest).
pub const DEFAULT_AVIF_SPEED: u8 = 8;

/// Synchronous transcoder. Callers run it on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct ImageTranscoder {
    avif_speed: u8,
}

impl Default for ImageTranscoder {
    fn default() -> Self {
        Self::new(DEFAULT_AVIF_SPEED)
    }
}

impl ImageTranscoder {
    /// Creates a transcoder with the given AVIF speed, clamped to 1-10.
    #[must_use]
    pub fn new(avif_speed: u8) -> Self {
        Self {
            avif_speed: avif_speed.clamp(1, 10),
        }
    }

    /// Applies the resize rules: both dimensions crop to cover the exact
    /// box around the centre, one dimension scales preserving aspect ratio.
    #[must_use]
    pub fn resize(image: DynamicImage, width: Option<u32>, height: Option<u32>) -> DynamicImage {
        let (src_w, src_h) = image.dimensions();
        match (width, height) {
            (Some(w), Some(h)) => image.resize_to_fill(w, h, FilterType::Lanczos3),
            (Some(w), None) => {
                let h = scaled(src_h, w, src_w);
                image.resize_exact(w, h, FilterType::Lanczos3)
            }
            (None, Some(h)) => {
                let w = scaled(src_w, h, src_h);
                image.resize_exact(w, h, FilterType::Lanczos3)
            }
            (None, None) => image,
        }
    }

    fn encode(&self, image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, ProxyError> {
        let mut buf = Vec::new();
        let result = match format {
            OutputFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality)),
            OutputFormat::Png => image.write_with_encoder(PngEncoder::new(&mut buf)),
            OutputFormat::Webp => DynamicImage::ImageRgba8(image.to_rgba8())
                .write_with_encoder(WebPEncoder::new_lossless(&mut buf)),
            OutputFormat::Avif => DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(
                AvifEncoder::new_with_speed_quality(&mut buf, self.avif_speed, quality),
            ),
        };
        result.map_err(|e| ProxyError::encode(format!("{format}: {e}")))?;
        Ok(buf)
    }
}

/// `part * target / whole`, rounded, never zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled(part: u32, target: u32, whole: u32) -> u32 {
    if whole == 0 {
        return target.max(1);
    }
    let value = (f64::from(part) * f64::from(target) / f64::from(whole)).round();
    (value as u32).max(1)
}

impl TranscoderPort for ImageTranscoder {
    fn transcode(&self, source: &[u8], options: &ImageOptions) -> Result<EncodedImage, ProxyError> {
        let decoded = image::load_from_memory(source).map_err(|e| ProxyError::decode(e.to_string()))?;
        trace!(
            width = decoded.width(),
            height = decoded.height(),
            "Decoded source image"
        );

        let resized = Self::resize(decoded, options.width, options.height);
        let (width, height) = resized.dimensions();
        let bytes = self.encode(&resized, options.format, options.quality)?;

        Ok(EncodedImage {
            bytes: Bytes::from(bytes),
            format: options.format,
            width,
            height,
        })
    }
}
