//! Key/value storage backends with browser-like quota semantics.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::errors::StorageError;
use crate::domain::ports::KeyValuePort;

/// Default per-origin quota, counted as key plus value bytes.
pub const DEFAULT_QUOTA: usize = 5 * 1024 * 1024;

fn usage(entries: &HashMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// Checks the quota as if `key` were set to `value`.
fn check_quota(
    entries: &HashMap<String, String>,
    key: &str,
    value: &str,
    quota: usize,
) -> Result<(), StorageError> {
    let current = entries.get(key).map_or(0, |old| key.len() + old.len());
    let projected = usage(entries) - current + key.len() + value.len();
    if projected > quota {
        return Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            limit: quota,
        });
    }
    Ok(())
}

/// Volatile storage, the equivalent of session storage.
#[derive(Debug)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    quota: usize,
}

impl MemoryKeyValueStore {
    /// Creates an empty store with the default quota.
    #[must_use]
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA)
    }

    /// Creates an empty store holding at most `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota,
        }
    }
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValuePort for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        check_quota(&entries, key, value, self.quota)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Persistent storage backed by a JSON object file, the equivalent of
/// local storage. Every write replaces the file atomically.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
    quota: usize,
}

impl FileKeyValueStore {
    /// Opens the store at `path`. A missing file is an empty store; an
    /// unreadable one is logged and treated as empty.
    ///
    /// # Errors
    /// Returns `StorageError::Io` if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>, quota: usize) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Storage file is malformed, starting empty");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "Opened storage file");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            quota,
        })
    }

    /// Opens `local_storage.json` in the default data directory.
    ///
    /// # Errors
    /// Returns `StorageError::Io` if the data directory cannot be determined
    /// or the file cannot be read.
    pub fn default_location() -> Result<Self, StorageError> {
        let dir = ProjectDirs::from("com", "linuxmobile", "inkwell")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| std::io::Error::other("failed to determine data directory"))?;
        Self::open(dir.join("local_storage.json"), DEFAULT_QUOTA)
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let content = serde_json::to_string(entries)?;
        let parent = self
            .path
            .parent()
            .ok_or_else(|| std::io::Error::other("Invalid path"))?;
        fs::create_dir_all(parent)?;
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValuePort for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        check_quota(&entries, key, value, self.quota)?;
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&entries) {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_quota() {
        let store = MemoryKeyValueStore::with_quota(10);
        store.set("a", "12345").unwrap();
        // replacing counts only the new value
        store.set("a", "123456789").unwrap();

        let err = store.set("b", "12").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 10, .. }));
        assert_eq!(store.get("a").unwrap().as_deref(), Some("123456789"));
    }

    #[test]
    fn test_memory_remove() {
        let store = MemoryKeyValueStore::new();
        store.set("cart", "[]").unwrap();
        store.remove("cart").unwrap();
        assert!(store.get("cart").unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("local_storage.json");
        {
            let store = FileKeyValueStore::open(&path, DEFAULT_QUOTA).unwrap();
            store.set("cart", r#"[{"id":"1"}]"#).unwrap();
            store.set("isAdmin", "true").unwrap();
            store.remove("isAdmin").unwrap();
        }

        let store = FileKeyValueStore::open(&path, DEFAULT_QUOTA).unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some(r#"[{"id":"1"}]"#));
        assert!(store.get("isAdmin").unwrap().is_none());
    }

    #[test]
    fn test_file_store_malformed_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileKeyValueStore::open(&path, DEFAULT_QUOTA).unwrap();
        assert!(store.get("cart").unwrap().is_none());
    }

    #[test]
    fn test_file_store_quota_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        let store = FileKeyValueStore::open(&path, 16).unwrap();
        store.set("k", "small").unwrap();

        assert!(store.set("k", "this value is far too large").is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("small"));
        let on_disk = fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, r#"{"k":"small"}"#);
    }
}
