//! Bookmarked services store.

use std::sync::Arc;

use crate::domain::entities::Bookmark;
use crate::domain::ports::KeyValuePort;

use super::persistent_list::{ListItem, PersistentList};

/// Local storage key holding bookmarks.
pub const BOOKMARKS_STORAGE_KEY: &str = "bookmarks";

impl ListItem for Bookmark {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Saved services, unique by id.
#[derive(Debug)]
pub struct BookmarkStore {
    items: PersistentList<Bookmark>,
}

impl BookmarkStore {
    /// Loads bookmarks from storage.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValuePort>) -> Self {
        Self {
            items: PersistentList::load(BOOKMARKS_STORAGE_KEY, storage),
        }
    }

    /// Adds a bookmark unless one with the same id exists. Returns true if
    /// it was added.
    pub fn add(&self, bookmark: Bookmark) -> bool {
        self.items.update(|items| {
            if items.iter().any(|b| b.id == bookmark.id) {
                false
            } else {
                items.push(bookmark);
                true
            }
        })
    }

    /// Removes a bookmark. Returns true if it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.items.update(|items| {
            let before = items.len();
            items.retain(|b| b.id != id);
            items.len() != before
        })
    }

    /// Adds the bookmark if absent, removes it if present. Returns true if
    /// it is bookmarked afterwards.
    pub fn toggle(&self, bookmark: Bookmark) -> bool {
        self.items.update(|items| {
            if let Some(pos) = items.iter().position(|b| b.id == bookmark.id) {
                items.remove(pos);
                false
            } else {
                items.push(bookmark);
                true
            }
        })
    }

    /// Returns true if `id` is bookmarked.
    #[must_use]
    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.items.contains(id)
    }

    /// Returns all bookmarks in the order they were added.
    #[must_use]
    pub fn list(&self) -> Vec<Bookmark> {
        self.items.snapshot()
    }

    /// Removes all bookmarks.
    pub fn clear(&self) {
        self.items.update(Vec::clear);
    }

    /// Adopts bookmarks written by another tab.
    pub fn on_storage_event(&self, key: &str, new_value: Option<&str>) -> bool {
        self.items.on_storage_event(key, new_value)
    }
}
