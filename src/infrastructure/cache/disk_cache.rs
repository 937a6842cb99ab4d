//! Disk-backed named cache stores for persistence across restarts.
//!
//! Layout: one subdirectory per store, and per entry a `<hash>.body` file
//! with the raw body plus a `<hash>.meta` JSON file with key, status,
//! headers and storage time. Both files are replaced by renaming a fully
//! written temporary file, body first and meta last, so a reader never sees
//! a truncated body. Directories whose names are not valid store names are
//! ignored.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, trace, warn};

use super::memory_cache::validate_name;
use crate::domain::entities::{AssetResponse, CacheEntry};
use crate::domain::errors::{CacheError, CacheResult};
use crate::domain::ports::CacheStoragePort;

/// Maximum disk cache size in bytes (200 MB default).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 200 * 1024 * 1024;

const BODY_EXT: &str = "body";
const META_EXT: &str = "meta";

#[derive(Debug, Serialize, Deserialize)]
struct StoredMeta {
    key: String,
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

/// Disk-based cache stores.
pub struct DiskCacheStorage {
    root: PathBuf,
    max_size: u64,
    current_size: AtomicU64,
    item_count: AtomicUsize,
}

impl DiskCacheStorage {
    /// Opens cache storage rooted at `root`, creating it if needed.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or read.
    pub async fn new(root: PathBuf, max_size: u64) -> CacheResult<Self> {
        fs::create_dir_all(&root)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to create cache dir: {e}")))?;

        let mut total_size = 0u64;
        let mut count = 0usize;
        for store in list_store_dirs(&root).await? {
            for (_, _, size) in body_files(&store).await {
                total_size += size;
                count += 1;
            }
        }

        let cache = Self {
            root,
            max_size,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(count),
        };
        debug!(
            root = %cache.root.display(),
            size = total_size,
            entries = count,
            "Opened disk cache storage"
        );
        cache.cleanup_if_needed().await;
        Ok(cache)
    }

    /// Opens storage in the default location (`<cache dir>/inkwell/assets`).
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub async fn default_location(max_size: u64) -> CacheResult<Self> {
        Self::new(default_cache_path(), max_size).await
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the total size of stored bodies in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_paths(&self, cache: &str, key: &str) -> (PathBuf, PathBuf) {
        let digest = Sha256::digest(key.as_bytes());
        let name = hex::encode(&digest[..16]);
        let dir = self.root.join(cache);
        (
            dir.join(format!("{name}.{BODY_EXT}")),
            dir.join(format!("{name}.{META_EXT}")),
        )
    }

    async fn read_meta(path: &Path) -> CacheResult<Option<StoredMeta>> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::IoError(format!("Failed to read entry: {e}"))),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }

    async fn remove_entry(&self, body: &Path, meta: &Path) -> bool {
        let size = fs::metadata(body).await.map(|m| m.len()).ok();
        let _ = fs::remove_file(meta).await;
        match fs::remove_file(body).await {
            Ok(()) => {
                if let Some(size) = size {
                    self.current_size.fetch_sub(size, Ordering::Relaxed);
                    self.item_count.fetch_sub(1, Ordering::Relaxed);
                }
                true
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %body.display(), error = %e, "Failed to remove cache entry");
                }
                false
            }
        }
    }

    /// Removes least recently accessed entries until the total size is 10%
    /// below the limit.
    async fn cleanup_if_needed(&self) {
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }
        debug!(current_size, max_size = self.max_size, "Disk cache over limit, cleaning up");

        let Ok(stores) = list_store_dirs(&self.root).await else {
            return;
        };
        let mut files = Vec::new();
        for store in stores {
            files.extend(body_files(&store).await);
        }
        files.sort_by_key(|(_, accessed, _)| *accessed);

        let target = current_size - self.max_size + (self.max_size / 10);
        let mut freed_size = 0u64;
        let mut freed_count = 0usize;
        for (body, _, _) in files {
            if freed_size >= target {
                break;
            }
            let meta = body.with_extension(META_EXT);
            let size = fs::metadata(&body).await.map(|m| m.len()).unwrap_or(0);
            if self.remove_entry(&body, &meta).await {
                freed_size += size;
                freed_count += 1;
            }
        }
        debug!(freed_size, freed_count, "Disk cache cleanup complete");
    }
}

#[async_trait]
impl CacheStoragePort for DiskCacheStorage {
    async fn open(&self, cache: &str) -> CacheResult<()> {
        validate_name(cache)?;
        fs::create_dir_all(self.root.join(cache))
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to create store: {e}")))
    }

    async fn lookup(&self, cache: &str, key: &str) -> CacheResult<Option<CacheEntry>> {
        validate_name(cache)?;
        let (body_path, meta_path) = self.entry_paths(cache, key);
        let Some(meta) = Self::read_meta(&meta_path).await? else {
            trace!(cache, key, "Disk cache miss");
            return Ok(None);
        };
        if meta.key != key {
            trace!(cache, key, "Disk cache hash collision");
            return Ok(None);
        }
        let body = match fs::read(&body_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::IoError(format!("Failed to read body: {e}"))),
        };
        trace!(cache, key, "Disk cache hit");
        Ok(Some(CacheEntry {
            key: meta.key,
            response: AssetResponse {
                status: meta.status,
                headers: meta.headers,
                body: Bytes::from(body),
            },
            stored_at: meta.stored_at,
        }))
    }

    async fn put(&self, cache: &str, key: &str, response: AssetResponse) -> CacheResult<()> {
        self.open(cache).await?;
        let (body_path, meta_path) = self.entry_paths(cache, key);
        let meta = StoredMeta {
            key: key.to_string(),
            status: response.status,
            headers: response.headers,
            stored_at: Utc::now(),
        };
        let meta_json =
            serde_json::to_vec(&meta).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let old_size = fs::metadata(&body_path).await.map(|m| m.len()).ok();
        write_atomic(body_path, response.body.clone())
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to write body: {e}")))?;
        write_atomic(meta_path, Bytes::from(meta_json))
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to write meta: {e}")))?;

        let new_size = response.body.len() as u64;
        if let Some(old) = old_size {
            if new_size > old {
                self.current_size.fetch_add(new_size - old, Ordering::Relaxed);
            } else {
                self.current_size.fetch_sub(old - new_size, Ordering::Relaxed);
            }
        } else {
            self.current_size.fetch_add(new_size, Ordering::Relaxed);
            self.item_count.fetch_add(1, Ordering::Relaxed);
        }
        debug!(cache, key, size = new_size, "Stored response in disk cache");

        self.cleanup_if_needed().await;
        Ok(())
    }

    async fn evict(&self, cache: &str, key: &str) -> CacheResult<bool> {
        validate_name(cache)?;
        let (body_path, meta_path) = self.entry_paths(cache, key);
        let removed = self.remove_entry(&body_path, &meta_path).await;
        if removed {
            debug!(cache, key, "Evicted from disk cache");
        }
        Ok(removed)
    }

    async fn cache_names(&self) -> CacheResult<Vec<String>> {
        let mut names: Vec<String> = list_store_dirs(&self.root)
            .await?
            .iter()
            .filter_map(|dir| dir.file_name()?.to_str().map(str::to_string))
            .filter(|name| {
                let valid = validate_name(name).is_ok();
                if !valid {
                    trace!(name = %name, "Ignoring foreign directory in cache root");
                }
                valid
            })
            .collect();
        names.sort();
        Ok(names)
    }

    async fn delete_cache(&self, cache: &str) -> CacheResult<bool> {
        validate_name(cache)?;
        let dir = self.root.join(cache);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(false);
        }
        let files = body_files(&dir).await;
        let size: u64 = files.iter().map(|(_, _, size)| size).sum();

        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to delete store: {e}")))?;
        self.current_size.fetch_sub(size, Ordering::Relaxed);
        self.item_count.fetch_sub(files.len(), Ordering::Relaxed);
        debug!(cache, entries = files.len(), "Deleted disk cache store");
        Ok(true)
    }
}

/// Writes `contents` to a temporary file beside `path`, then renames it into
/// place.
async fn write_atomic(path: PathBuf, contents: Bytes) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || {
        let dir = path
            .parent()
            .ok_or_else(|| std::io::Error::other("Invalid entry path"))?;
        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        temp_file.write_all(&contents)?;
        temp_file.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)?
}

async fn list_store_dirs(root: &Path) -> CacheResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(root)
        .await
        .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;
    let mut dirs = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

async fn body_files(dir: &Path) -> Vec<(PathBuf, std::time::SystemTime, u64)> {
    let mut files = Vec::new();
    let Ok(mut entries) = fs::read_dir(dir).await else {
        return files;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != BODY_EXT) {
            continue;
        }
        if let Ok(meta) = entry.metadata().await {
            let accessed = meta.accessed().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            files.push((path, accessed, meta.len()));
        }
    }
    files
}

/// Returns the default cache directory path.
fn default_cache_path() -> PathBuf {
    directories::ProjectDirs::from("com", "linuxmobile", "inkwell").map_or_else(
        || std::env::temp_dir().join("inkwell").join("cache").join("assets"),
        |dirs| dirs.cache_dir().join("assets"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_cache(max_size: u64) -> (DiskCacheStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCacheStorage::new(temp_dir.path().to_path_buf(), max_size)
            .await
            .unwrap();
        (cache, temp_dir)
    }

    fn image(body: &'static [u8]) -> AssetResponse {
        AssetResponse::new(200, body).with_header("content-type", "image/webp")
    }

    #[tokio::test]
    async fn test_put_and_lookup() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;
        cache
            .put("v1", "https://a.bg/images/cover.webp", image(b"RIFF"))
            .await
            .unwrap();

        let entry = cache
            .lookup("v1", "https://a.bg/images/cover.webp")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.response.status, 200);
        assert_eq!(entry.response.content_type(), Some("image/webp"));
        assert_eq!(&entry.response.body[..], b"RIFF");
    }

    #[tokio::test]
    async fn test_lookup_miss() {
        let (cache, _temp) = create_test_cache(1024).await;
        assert!(cache.lookup("v1", "https://a.bg/x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = DiskCacheStorage::new(temp_dir.path().to_path_buf(), 1024)
                .await
                .unwrap();
            cache.put("v1", "k", image(b"hello")).await.unwrap();
        }

        let cache = DiskCacheStorage::new(temp_dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 5);
        assert!(cache.lookup("v1", "k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_whole_entry() {
        let (cache, temp) = create_test_cache(1024 * 1024).await;
        cache.put("v1", "k", image(b"first version")).await.unwrap();
        cache
            .put(
                "v1",
                "k",
                AssetResponse::new(200, "v2").with_header("content-type", "image/png"),
            )
            .await
            .unwrap();

        let entry = cache.lookup("v1", "k").await.unwrap().unwrap();
        assert_eq!(&entry.response.body[..], b"v2");
        assert_eq!(entry.response.content_type(), Some("image/png"));

        let files = std::fs::read_dir(temp.path().join("v1")).unwrap().count();
        assert_eq!(files, 2);
    }

    #[tokio::test]
    async fn test_foreign_directories_ignored() {
        let (cache, temp) = create_test_cache(1024).await;
        std::fs::create_dir(temp.path().join("old cache")).unwrap();
        std::fs::create_dir(temp.path().join(".hidden")).unwrap();
        cache.open("inkwell-cache-v1").await.unwrap();

        assert_eq!(cache.cache_names().await.unwrap(), vec!["inkwell-cache-v1"]);
    }

    #[tokio::test]
    async fn test_counters_follow_writes() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;

        cache.put("v1", "a", image(b"hello")).await.unwrap();
        cache.put("v1", "b", image(b"world!")).await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_size(), 11);

        cache.put("v1", "a", image(b"hey")).await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_size(), 9);

        assert!(cache.evict("v1", "b").await.unwrap());
        assert!(!cache.evict("v1", "b").await.unwrap());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 3);
    }

    #[tokio::test]
    async fn test_delete_cache() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;
        cache.put("old-v0", "a", image(b"1234")).await.unwrap();
        cache.put("new-v1", "a", image(b"5678")).await.unwrap();

        assert_eq!(cache.cache_names().await.unwrap(), vec!["new-v1", "old-v0"]);
        assert!(cache.delete_cache("old-v0").await.unwrap());
        assert!(!cache.delete_cache("old-v0").await.unwrap());
        assert_eq!(cache.cache_names().await.unwrap(), vec!["new-v1"]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 4);
    }

    #[tokio::test]
    async fn test_cleanup_over_limit() {
        let (cache, _temp) = create_test_cache(10).await;

        cache.put("v1", "first", image(b"123456")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        cache.put("v1", "second", image(b"123456")).await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 6);
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let (cache, _temp) = create_test_cache(1024).await;
        assert!(matches!(
            cache.put("../x", "k", image(b"1")).await,
            Err(CacheError::InvalidName(_))
        ));
    }
}
