//! A list of id-keyed items mirrored to key/value storage.
//!
//! The in-memory copy is authoritative. Every mutation writes the whole list
//! back as a JSON array; write failures are logged and swallowed.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::ports::KeyValuePort;

/// An element of a [`PersistentList`].
pub trait ListItem: Clone + Serialize + DeserializeOwned + Send {
    /// Unique identifier within the list.
    fn id(&self) -> &str;

    /// Whether a stored item is acceptable on load.
    fn is_valid(&self) -> bool {
        true
    }
}

/// Storage-backed list of unique items.
pub struct PersistentList<T> {
    key: String,
    storage: Arc<dyn KeyValuePort>,
    items: Mutex<Vec<T>>,
}

impl<T> std::fmt::Debug for PersistentList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentList")
            .field("key", &self.key)
            .field("len", &self.items.lock().len())
            .finish_non_exhaustive()
    }
}

impl<T: ListItem> PersistentList<T> {
    /// Loads the list stored under `key`. Missing, unreadable or non-array
    /// values yield an empty list.
    #[must_use]
    pub fn load(key: impl Into<String>, storage: Arc<dyn KeyValuePort>) -> Self {
        let key = key.into();
        let items = match storage.get(&key) {
            Ok(Some(raw)) => parse_items(&key, &raw).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read stored list, starting empty");
                Vec::new()
            }
        };
        debug!(key = %key, count = items.len(), "Loaded stored list");

        Self {
            key,
            storage,
            items: Mutex::new(items),
        }
    }

    /// Returns the storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns a copy of the items.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().clone()
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns true if there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Returns true if an item with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.lock().iter().any(|item| item.id() == id)
    }

    /// Mutates the list and persists the result.
    pub fn update<R>(&self, mutate: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut items = self.items.lock();
        let result = mutate(&mut items);
        self.persist(&items);
        result
    }

    fn persist(&self, items: &[T]) {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to serialize list");
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, &raw) {
            warn!(key = %self.key, error = %e, "Failed to persist list, keeping in-memory state");
        }
    }

    /// Adopts a write made by another tab. `new_value` of `None` means the
    /// key was removed. Returns true if the in-memory list was replaced.
    pub fn on_storage_event(&self, key: &str, new_value: Option<&str>) -> bool {
        if key != self.key {
            return false;
        }
        let items = match new_value {
            None => Vec::new(),
            Some(raw) => match parse_items(&self.key, raw) {
                Some(items) => items,
                None => return false,
            },
        };
        debug!(key = %self.key, count = items.len(), "Adopted list from another tab");
        *self.items.lock() = items;
        true
    }
}

fn parse_items<T: ListItem>(key: &str, raw: &str) -> Option<Vec<T>> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Stored list is not valid JSON");
            return None;
        }
    };
    let serde_json::Value::Array(entries) = value else {
        warn!(key, "Stored list is not an array");
        return None;
    };

    let mut items: Vec<T> = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<T>(entry) {
            Ok(item) if item.is_valid() && !items.iter().any(|i| i.id() == item.id()) => {
                items.push(item);
            }
            Ok(item) => debug!(key, id = item.id(), "Skipping invalid or duplicate stored item"),
            Err(e) => warn!(key, error = %e, "Skipping malformed stored item"),
        }
    }
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::local_storage::MemoryKeyValueStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        text: String,
    }

    impl ListItem for Note {
        fn id(&self) -> &str {
            &self.id
        }

        fn is_valid(&self) -> bool {
            !self.text.is_empty()
        }
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_load_rejects_non_array() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage.set("notes", r#"{"id":"1"}"#).unwrap();
        let list: PersistentList<Note> = PersistentList::load("notes", storage);
        assert!(list.is_empty());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage.set("notes", "not json").unwrap();
        let list: PersistentList<Note> = PersistentList::load("notes", storage);
        assert!(list.is_empty());
    }

    #[test]
    fn test_load_skips_invalid_entries() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage
            .set(
                "notes",
                r#"[{"id":"1","text":"a"},{"id":"2","text":""},{"id":"1","text":"dup"},42]"#,
            )
            .unwrap();
        let list: PersistentList<Note> = PersistentList::load("notes", storage);
        assert_eq!(list.snapshot(), vec![note("1", "a")]);
    }

    #[test]
    fn test_update_persists() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let list: PersistentList<Note> = PersistentList::load("notes", storage.clone());

        list.update(|items| items.push(note("1", "hello")));

        let raw = storage.get("notes").unwrap().unwrap();
        let stored: Vec<Note> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, vec![note("1", "hello")]);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let storage = Arc::new(MemoryKeyValueStore::with_quota(8));
        let list: PersistentList<Note> = PersistentList::load("notes", storage.clone());

        list.update(|items| items.push(note("1", "far too long for the quota")));

        assert_eq!(list.len(), 1);
        assert!(storage.get("notes").unwrap().is_none());
    }

    #[test]
    fn test_storage_event() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let list: PersistentList<Note> = PersistentList::load("notes", storage);

        assert!(!list.on_storage_event("other", Some("[]")));
        assert!(!list.on_storage_event("notes", Some("oops")));
        assert!(list.on_storage_event("notes", Some(r#"[{"id":"9","text":"x"}]"#)));
        assert!(list.contains("9"));
        assert!(list.on_storage_event("notes", None));
        assert!(list.is_empty());
    }
}
