//! Image transcoding.

pub mod transcoder;

pub use transcoder::{DEFAULT_AVIF_SPEED, ImageTranscoder};
