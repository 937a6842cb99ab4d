//! Application layer with services and use cases.

/// Asset cache, URL builder and client-side stores.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use services::{
    AssetCache, AssetCacheConfig, BookmarkStore, CartStore, ImageUrlBuilder, LanguageStore,
    PersistenceNotice,
};
pub use use_cases::OptimizeImageUseCase;
