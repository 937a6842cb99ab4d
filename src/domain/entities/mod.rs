//! Domain entity definitions.

mod asset;
mod bookmark;
mod cart;
mod environment;
mod image;
mod language;
mod secret;
mod submission;

pub use asset::{AssetResponse, CacheEntry, FetchRequest, RequestMode, cache_key_for};
pub use bookmark::Bookmark;
pub use cart::{CartItem, CartProduct};
pub use environment::Environment;
pub use image::{
    DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY, EncodedImage, ImageOptions, ImageSource,
    OptimizeRequest, OutputFormat,
};
pub use language::{Language, UnsupportedLanguage};
pub use secret::SecretKey;
pub use submission::ContactSubmission;
