//! Application services.

pub mod asset_cache;
pub mod bookmark_store;
pub mod cache_rules;
pub mod cart_store;
pub mod image_url;
pub mod language_store;
pub mod persistence_notice;
pub mod persistent_list;
pub mod registration;

pub use asset_cache::{
    AssetCache, AssetCacheConfig, DEFAULT_CACHE_VERSION, DEFAULT_INSTALL_RETRY,
    DEFAULT_PLACEHOLDER, DispatchStats, FetchOutcome, ResponseSource, WorkerState,
};
pub use bookmark_store::{BOOKMARKS_STORAGE_KEY, BookmarkStore};
pub use cache_rules::{Fallback, PassReason, ResourceClass, Route, Rule, RuleSet, Strategy};
pub use cart_store::{CART_STORAGE_KEY, CartStore};
pub use image_url::{ImageUrlBuilder, OPTIMIZE_ENDPOINT, is_passthrough_source};
pub use language_store::LanguageStore;
pub use persistence_notice::PersistenceNotice;
pub use persistent_list::{ListItem, PersistentList};
pub use registration::{Registration, register, unregister};
