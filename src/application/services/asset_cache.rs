//! Offline-capable asset cache modelled on a service worker.
//!
//! Lifecycle: `install` precaches a fixed manifest into the current named
//! cache and skips waiting straight into `activate`, which purges every other
//! cache version and claims clients. Once activated, `handle_fetch` routes
//! each request through the [`RuleSet`] and applies network-first or
//! cache-first with the rule's fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use parking_lot::{Mutex, RwLock};
use reqwest::Url;
use tracing::{debug, info, trace, warn};

use crate::domain::entities::{AssetResponse, FetchRequest, cache_key_for};
use crate::domain::errors::{AssetCacheError, NetworkError};
use crate::domain::ports::{CacheStoragePort, NetworkPort};

use super::cache_rules::{Fallback, Route, RuleSet, Strategy};

/// Default cache version name.
pub const DEFAULT_CACHE_VERSION: &str = "inkwell-cache-v1";

/// Default placeholder image path.
pub const DEFAULT_PLACEHOLDER: &str = "/images/placeholder.svg";

/// Default minimum gap between install attempts after a failure.
pub const DEFAULT_INSTALL_RETRY: Duration = Duration::from_secs(30);

/// Configuration for the asset cache.
#[derive(Debug, Clone)]
pub struct AssetCacheConfig {
    /// Name of the current cache store.
    pub cache_version: String,
    /// Site-relative paths fetched during install.
    pub precache: Vec<String>,
    /// Site-relative path of the placeholder image. Must be precached.
    pub placeholder: String,
    /// Site-relative path of the root document.
    pub root: String,
    /// Minimum gap before a failed install is retried by an incoming request.
    pub install_retry: Duration,
}

impl Default for AssetCacheConfig {
    fn default() -> Self {
        Self {
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            precache: vec![
                "/".to_string(),
                "/manifest.json".to_string(),
                DEFAULT_PLACEHOLDER.to_string(),
            ],
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            root: "/".to_string(),
            install_retry: DEFAULT_INSTALL_RETRY,
        }
    }
}

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// Created, not yet installed.
    #[default]
    Parsed,
    /// Precaching.
    Installing,
    /// Precache complete.
    Installed,
    /// Purging old caches.
    Activating,
    /// Handling fetches.
    Activated,
    /// Failed install or unregistered.
    Redundant,
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Fresh from the network.
    Network,
    /// Cache hit for the request.
    Cache,
    /// Served by a fallback policy.
    Fallback(Fallback),
}

/// Result of dispatching a request.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The cache does not handle this request; the caller goes to the network.
    PassThrough,
    /// The cache produced a response.
    Respond {
        /// Response to return.
        response: AssetResponse,
        /// Where it came from.
        source: ResponseSource,
    },
}

impl FetchOutcome {
    fn respond(response: AssetResponse, source: ResponseSource) -> Self {
        Self::Respond { response, source }
    }
}

/// Counters for cache activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchStats {
    /// Requests answered from cache.
    pub hits: u64,
    /// Cache misses that went to the network.
    pub misses: u64,
    /// Responses written to the cache.
    pub stores: u64,
    /// Responses served by a fallback.
    pub fallbacks: u64,
}

/// Service-worker style asset cache.
pub struct AssetCache {
    config: AssetCacheConfig,
    site: Url,
    rules: RuleSet,
    network: Arc<dyn NetworkPort>,
    caches: Arc<dyn CacheStoragePort>,
    state: RwLock<WorkerState>,
    clients_claimed: AtomicBool,
    retry_pending: AtomicBool,
    installing: AtomicBool,
    last_install: Mutex<Option<Instant>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    fallbacks: AtomicU64,
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("config", &self.config)
            .field("site", &self.site.as_str())
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl AssetCache {
    /// Creates a cache for `site` in the `Parsed` state.
    #[must_use]
    pub fn new(
        config: AssetCacheConfig,
        site: Url,
        network: Arc<dyn NetworkPort>,
        caches: Arc<dyn CacheStoragePort>,
    ) -> Self {
        let rules = RuleSet::new(&site);
        Self {
            config,
            site,
            rules,
            network,
            caches,
            state: RwLock::new(WorkerState::Parsed),
            clients_claimed: AtomicBool::new(false),
            retry_pending: AtomicBool::new(false),
            installing: AtomicBool::new(false),
            last_install: Mutex::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AssetCacheConfig {
        &self.config
    }

    /// Returns the rule list.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns true once `activate` has claimed clients.
    #[must_use]
    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::Relaxed)
    }

    /// Returns dispatch counters.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }

    fn set_state(&self, state: WorkerState) {
        let mut current = self.state.write();
        trace!(from = ?*current, to = ?state, "Asset cache state change");
        *current = state;
    }

    fn site_url(&self, path: &str) -> Result<Url, AssetCacheError> {
        self.site
            .join(path)
            .map_err(|e| AssetCacheError::InstallFailed {
                url: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Precaches the manifest, then activates immediately.
    ///
    /// All manifest entries are fetched before anything is written; if any
    /// fails, or a write fails, the worker becomes `Redundant` and nothing
    /// from this attempt is left in the store. A failed install is retried
    /// by `handle_fetch` once `install_retry` has elapsed.
    ///
    /// # Errors
    /// Returns `AssetCacheError::InstallFailed` for the first failing entry,
    /// or a cache error from storage.
    pub async fn install(&self) -> Result<(), AssetCacheError> {
        self.set_state(WorkerState::Installing);
        *self.last_install.lock() = Some(Instant::now());
        info!(cache = %self.config.cache_version, entries = self.config.precache.len(), "Installing asset cache");

        match self.precache().await {
            Ok(()) => {
                self.set_state(WorkerState::Installed);
                debug!("Precache complete, skipping waiting");
                self.activate().await?;
                self.retry_pending.store(false, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Asset cache install failed");
                self.set_state(WorkerState::Redundant);
                self.retry_pending.store(true, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Re-runs a failed install when the retry interval has passed.
    /// Returns true if the worker is activated afterwards.
    async fn retry_install_if_due(&self) -> bool {
        if self.state() != WorkerState::Redundant || !self.retry_pending.load(Ordering::Relaxed) {
            return false;
        }
        let due = self
            .last_install
            .lock()
            .is_none_or(|at| at.elapsed() >= self.config.install_retry);
        if !due
            || self
                .installing
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return false;
        }

        info!("Retrying asset cache install");
        let result = self.install().await;
        self.installing.store(false, Ordering::Release);
        result.is_ok()
    }

    async fn precache(&self) -> Result<(), AssetCacheError> {
        let cache = &self.config.cache_version;
        let existed = self.caches.has_cache(cache).await?;
        self.caches.open(cache).await?;

        let requests = self
            .config
            .precache
            .iter()
            .map(|path| self.site_url(path).map(FetchRequest::get))
            .collect::<Result<Vec<_>, _>>()?;

        let results = join_all(requests.iter().map(|req| self.network.fetch(req))).await;

        let mut responses = Vec::with_capacity(results.len());
        for (request, result) in requests.iter().zip(results) {
            let url = request.url.to_string();
            match result {
                Ok(response) if response.is_success() => responses.push((request.cache_key(), response)),
                Ok(response) => {
                    return Err(AssetCacheError::InstallFailed {
                        url,
                        reason: format!("HTTP {}", response.status),
                    });
                }
                Err(e) => {
                    return Err(AssetCacheError::InstallFailed {
                        url,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut written = Vec::with_capacity(responses.len());
        for (key, response) in responses {
            if let Err(e) = self.caches.put(cache, &key, response).await {
                self.discard_partial_install(existed, &written).await;
                return Err(e.into());
            }
            written.push(key);
        }
        Ok(())
    }

    async fn discard_partial_install(&self, existed: bool, written: &[String]) {
        let cache = &self.config.cache_version;
        if !existed {
            if let Err(e) = self.caches.delete_cache(cache).await {
                warn!(cache = %cache, error = %e, "Failed to drop partially installed cache");
            }
            return;
        }
        for key in written {
            if let Err(e) = self.caches.evict(cache, key).await {
                warn!(key, error = %e, "Failed to evict partially installed entry");
            }
        }
    }

    /// Deletes every cache store except the current version and claims
    /// clients.
    ///
    /// # Errors
    /// Returns a cache error if stores cannot be listed or deleted.
    pub async fn activate(&self) -> Result<(), AssetCacheError> {
        self.set_state(WorkerState::Activating);

        if let Err(e) = self.purge_old_caches().await {
            warn!(error = %e, "Asset cache activation failed");
            self.set_state(WorkerState::Redundant);
            self.retry_pending.store(true, Ordering::Relaxed);
            return Err(e);
        }

        let current = &self.config.cache_version;
        self.clients_claimed.store(true, Ordering::Relaxed);
        self.set_state(WorkerState::Activated);
        info!(cache = %current, "Asset cache activated");
        Ok(())
    }

    async fn purge_old_caches(&self) -> Result<(), AssetCacheError> {
        let current = &self.config.cache_version;
        for name in self.caches.cache_names().await? {
            if &name != current {
                info!(cache = %name, "Deleting old cache");
                self.caches.delete_cache(&name).await?;
            }
        }
        Ok(())
    }

    /// Purges every cache store and retires the worker.
    ///
    /// # Errors
    /// Returns a cache error if stores cannot be listed or deleted.
    pub async fn unregister(&self) -> Result<usize, AssetCacheError> {
        let mut purged = 0;
        for name in self.caches.cache_names().await? {
            if self.caches.delete_cache(&name).await? {
                purged += 1;
            }
        }
        self.clients_claimed.store(false, Ordering::Relaxed);
        self.retry_pending.store(false, Ordering::Relaxed);
        self.set_state(WorkerState::Redundant);
        info!(purged, "Asset cache unregistered");
        Ok(purged)
    }

    /// Dispatches an intercepted request.
    ///
    /// The returned future resolves only after any cache write has finished.
    ///
    /// # Errors
    /// Returns `AssetCacheError::Network` when the network fails and the
    /// rule's fallback has nothing to serve.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, AssetCacheError> {
        if self.state() != WorkerState::Activated && !self.retry_install_if_due().await {
            return Ok(FetchOutcome::PassThrough);
        }

        match self.rules.route(request) {
            Route::PassThrough(reason) => {
                trace!(url = %request.url, ?reason, "Passing request through");
                Ok(FetchOutcome::PassThrough)
            }
            Route::Handle { class, strategy } => {
                trace!(url = %request.url, class = class.as_str(), ?strategy, "Handling request");
                match strategy {
                    Strategy::NetworkFirst(fallback) => self.network_first(request, fallback).await,
                    Strategy::CacheFirst(fallback) => self.cache_first(request, fallback).await,
                }
            }
        }
    }

    async fn network_first(
        &self,
        request: &FetchRequest,
        fallback: Fallback,
    ) -> Result<FetchOutcome, AssetCacheError> {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(request, &response).await;
                Ok(FetchOutcome::respond(response, ResponseSource::Network))
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Network failed, trying fallback");
                self.fall_back(request, fallback, e).await
            }
        }
    }

    async fn cache_first(
        &self,
        request: &FetchRequest,
        fallback: Fallback,
    ) -> Result<FetchOutcome, AssetCacheError> {
        if let Some(response) = self.cached(&request.cache_key()).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(url = %request.url, "Cache hit");
            return Ok(FetchOutcome::respond(response, ResponseSource::Cache));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(request, &response).await;
                Ok(FetchOutcome::respond(response, ResponseSource::Network))
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Cache miss and network failed");
                // The request itself was just missed; only the placeholder can help.
                match fallback {
                    Fallback::PlaceholderAsset => self.fall_back(request, fallback, e).await,
                    _ => Err(e.into()),
                }
            }
        }
    }

    async fn fall_back(
        &self,
        request: &FetchRequest,
        fallback: Fallback,
        error: NetworkError,
    ) -> Result<FetchOutcome, AssetCacheError> {
        let found = match fallback {
            Fallback::None => None,
            Fallback::CachedRequest => self.cached(&request.cache_key()).await,
            Fallback::CachedRoot => match self.cached(&request.cache_key()).await {
                Some(response) => Some(response),
                None => self.cached_site_path(&self.config.root).await,
            },
            Fallback::PlaceholderAsset => self.cached_site_path(&self.config.placeholder).await,
        };

        match found {
            Some(response) => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                debug!(url = %request.url, ?fallback, "Served fallback");
                Ok(FetchOutcome::respond(response, ResponseSource::Fallback(fallback)))
            }
            None => Err(error.into()),
        }
    }

    async fn cached_site_path(&self, path: &str) -> Option<AssetResponse> {
        let url = self.site.join(path).ok()?;
        self.cached(&cache_key_for(&url)).await
    }

    async fn cached(&self, key: &str) -> Option<AssetResponse> {
        match self.caches.lookup(&self.config.cache_version, key).await {
            Ok(entry) => entry.map(|e| e.response),
            Err(e) => {
                warn!(key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Stores a copy of a successful response. Failures are logged only.
    async fn store(&self, request: &FetchRequest, response: &AssetResponse) {
        if !response.is_success() {
            return;
        }
        let key = request.cache_key();
        match self
            .caches
            .put(&self.config.cache_version, &key, response.clone())
            .await
        {
            Ok(()) => {
                self.stores.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!(key, error = %e, "Failed to store response in cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CacheEntry;
    use crate::domain::errors::{CacheError, CacheResult};
    use crate::domain::ports::mocks::MockNetwork;
    use crate::infrastructure::cache::{DiskCacheStorage, MemoryCacheStorage};

    const SITE: &str = "https://avtor.bg";
    const PLACEHOLDER_SVG: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>";

    struct Fixture {
        network: Arc<MockNetwork>,
        caches: Arc<MemoryCacheStorage>,
        worker: AssetCache,
    }

    fn url(path: &str) -> Url {
        Url::parse(SITE).unwrap().join(path).unwrap()
    }

    fn fixture() -> Fixture {
        let network = Arc::new(MockNetwork::new());
        network.respond_ok(&url("/").to_string(), "text/html", b"<html>home</html>");
        network.respond_ok(&url("/manifest.json").to_string(), "application/json", b"{}");
        network.respond_ok(&url(DEFAULT_PLACEHOLDER).to_string(), "image/svg+xml", PLACEHOLDER_SVG);

        let caches = Arc::new(MemoryCacheStorage::new(100));
        let worker = AssetCache::new(
            AssetCacheConfig::default(),
            Url::parse(SITE).unwrap(),
            network.clone(),
            caches.clone(),
        );
        Fixture {
            network,
            caches,
            worker,
        }
    }

    async fn installed() -> Fixture {
        let fx = fixture();
        fx.worker.install().await.unwrap();
        fx
    }

    fn body(outcome: &FetchOutcome) -> &[u8] {
        match outcome {
            FetchOutcome::Respond { response, .. } => &response.body,
            FetchOutcome::PassThrough => panic!("expected a response"),
        }
    }

    fn source(outcome: &FetchOutcome) -> ResponseSource {
        match outcome {
            FetchOutcome::Respond { source, .. } => *source,
            FetchOutcome::PassThrough => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn test_install_precaches_and_activates() {
        let fx = installed().await;

        assert_eq!(fx.worker.state(), WorkerState::Activated);
        assert!(fx.worker.clients_claimed());
        for path in ["/", "/manifest.json", DEFAULT_PLACEHOLDER] {
            let entry = fx
                .caches
                .lookup(DEFAULT_CACHE_VERSION, &url(path).to_string())
                .await
                .unwrap();
            assert!(entry.is_some(), "{path} should be precached");
        }
    }

    #[tokio::test]
    async fn test_install_failure_stores_nothing() {
        let fx = fixture();
        fx.network.respond(&url("/manifest.json").to_string(), AssetResponse::new(500, "boom"));

        let err = fx.worker.install().await.unwrap_err();
        assert!(matches!(err, AssetCacheError::InstallFailed { .. }));
        assert_eq!(fx.worker.state(), WorkerState::Redundant);
        let root = fx
            .caches
            .lookup(DEFAULT_CACHE_VERSION, &url("/").to_string())
            .await
            .unwrap();
        assert!(root.is_none());
    }

    #[tokio::test]
    async fn test_activation_purges_old_versions() {
        let fx = fixture();
        for old in ["inkwell-cache-v0", "legacy-static"] {
            fx.caches.open(old).await.unwrap();
            fx.caches
                .put(old, "https://avtor.bg/old.css", AssetResponse::new(200, "old"))
                .await
                .unwrap();
        }

        fx.worker.install().await.unwrap();

        assert_eq!(
            fx.caches.cache_names().await.unwrap(),
            vec![DEFAULT_CACHE_VERSION.to_string()]
        );
        assert!(!fx.caches.has_cache("inkwell-cache-v0").await.unwrap());
    }

    #[tokio::test]
    async fn test_not_activated_passes_through() {
        let fx = fixture();
        let outcome = fx.worker.handle_fetch(&FetchRequest::get(url("/images/a.png"))).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::PassThrough));
        assert_eq!(fx.network.total_fetches(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_fetches_once() {
        let fx = installed().await;
        let image = url("/images/cover.png");
        fx.network.respond_ok(image.as_str(), "image/png", b"png-bytes");

        let first = fx.worker.handle_fetch(&FetchRequest::get(image.clone())).await.unwrap();
        let second = fx.worker.handle_fetch(&FetchRequest::get(image.clone())).await.unwrap();

        assert_eq!(body(&first), body(&second));
        assert_eq!(source(&first), ResponseSource::Network);
        assert_eq!(source(&second), ResponseSource::Cache);
        assert_eq!(fx.network.fetch_count(image.as_str()), 1);
        assert_eq!(fx.worker.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_image_failure_serves_placeholder() {
        let fx = installed().await;
        fx.network.set_offline(true);

        let outcome = fx
            .worker
            .handle_fetch(&FetchRequest::get(url("/images/missing.jpg")))
            .await
            .unwrap();

        assert_eq!(body(&outcome), PLACEHOLDER_SVG);
        assert_eq!(source(&outcome), ResponseSource::Fallback(Fallback::PlaceholderAsset));
    }

    #[tokio::test]
    async fn test_font_failure_propagates() {
        let fx = installed().await;
        fx.network.set_offline(true);

        let err = fx
            .worker
            .handle_fetch(&FetchRequest::get(url("/fonts/inter.woff2")))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetCacheError::Network(_)));
    }

    #[tokio::test]
    async fn test_offline_navigation_uses_cached_page() {
        let fx = installed().await;
        let page = url("/books");
        fx.network.respond_ok(page.as_str(), "text/html", b"<html>books v1</html>");
        fx.worker.handle_fetch(&FetchRequest::navigate(page.clone())).await.unwrap();

        fx.network.set_offline(true);
        let outcome = fx.worker.handle_fetch(&FetchRequest::navigate(page)).await.unwrap();

        assert_eq!(body(&outcome), b"<html>books v1</html>");
        assert_eq!(source(&outcome), ResponseSource::Fallback(Fallback::CachedRoot));
    }

    #[tokio::test]
    async fn test_offline_navigation_falls_back_to_root() {
        let fx = installed().await;
        fx.network.set_offline(true);

        let outcome = fx
            .worker
            .handle_fetch(&FetchRequest::navigate(url("/never-visited")))
            .await
            .unwrap();
        assert_eq!(body(&outcome), b"<html>home</html>");
    }

    #[tokio::test]
    async fn test_network_first_refreshes_cache() {
        let fx = installed().await;
        let data = url("/data/services.json");
        fx.network.respond_ok(data.as_str(), "application/json", b"[1]");
        fx.worker.handle_fetch(&FetchRequest::get(data.clone())).await.unwrap();
        fx.network.respond_ok(data.as_str(), "application/json", b"[1,2]");
        fx.worker.handle_fetch(&FetchRequest::get(data.clone())).await.unwrap();

        fx.network.set_offline(true);
        let outcome = fx.worker.handle_fetch(&FetchRequest::get(data)).await.unwrap();
        assert_eq!(body(&outcome), b"[1,2]");
        assert_eq!(source(&outcome), ResponseSource::Fallback(Fallback::CachedRequest));
    }

    #[tokio::test]
    async fn test_error_responses_not_cached() {
        let fx = installed().await;
        let image = url("/images/gone.png");
        fx.network.respond(image.as_str(), AssetResponse::new(404, "nope"));

        fx.worker.handle_fetch(&FetchRequest::get(image.clone())).await.unwrap();
        fx.worker.handle_fetch(&FetchRequest::get(image.clone())).await.unwrap();

        assert_eq!(fx.network.fetch_count(image.as_str()), 2);
        assert!(fx.caches.lookup(DEFAULT_CACHE_VERSION, image.as_str()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pass_through_never_cached() {
        let fx = installed().await;
        let api = url("/api/contact");
        let outcome = fx.worker.handle_fetch(&FetchRequest::get(api.clone())).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::PassThrough));
        assert_eq!(fx.network.fetch_count(api.as_str()), 0);
    }

    /// Memory storage that can be told to fail writes or deletes.
    struct FlakyStorage {
        inner: MemoryCacheStorage,
        fail_put: Option<usize>,
        fail_delete: bool,
        puts: std::sync::atomic::AtomicUsize,
    }

    impl FlakyStorage {
        fn new(fail_put: Option<usize>, fail_delete: bool) -> Self {
            Self {
                inner: MemoryCacheStorage::new(100),
                fail_put,
                fail_delete,
                puts: std::sync::atomic::AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl CacheStoragePort for FlakyStorage {
        async fn open(&self, cache: &str) -> CacheResult<()> {
            self.inner.open(cache).await
        }

        async fn lookup(&self, cache: &str, key: &str) -> CacheResult<Option<CacheEntry>> {
            self.inner.lookup(cache, key).await
        }

        async fn put(&self, cache: &str, key: &str, response: AssetResponse) -> CacheResult<()> {
            let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_put == Some(n) {
                return Err(CacheError::IoError("disk full".to_string()));
            }
            self.inner.put(cache, key, response).await
        }

        async fn evict(&self, cache: &str, key: &str) -> CacheResult<bool> {
            self.inner.evict(cache, key).await
        }

        async fn cache_names(&self) -> CacheResult<Vec<String>> {
            self.inner.cache_names().await
        }

        async fn delete_cache(&self, cache: &str) -> CacheResult<bool> {
            if self.fail_delete {
                return Err(CacheError::IoError("permission denied".to_string()));
            }
            self.inner.delete_cache(cache).await
        }
    }

    fn online_network() -> Arc<MockNetwork> {
        let network = Arc::new(MockNetwork::new());
        network.respond_ok(&url("/").to_string(), "text/html", b"<html>home</html>");
        network.respond_ok(&url("/manifest.json").to_string(), "application/json", b"{}");
        network.respond_ok(&url(DEFAULT_PLACEHOLDER).to_string(), "image/svg+xml", PLACEHOLDER_SVG);
        network
    }

    fn worker_over(
        network: Arc<MockNetwork>,
        caches: Arc<dyn CacheStoragePort>,
        install_retry: Duration,
    ) -> AssetCache {
        let config = AssetCacheConfig {
            install_retry,
            ..AssetCacheConfig::default()
        };
        AssetCache::new(config, Url::parse(SITE).unwrap(), network, caches)
    }

    #[tokio::test]
    async fn test_foreign_directory_does_not_block_activation() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("old cache")).unwrap();
        let disk = DiskCacheStorage::new(temp.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        let worker = worker_over(online_network(), Arc::new(disk), DEFAULT_INSTALL_RETRY);

        worker.install().await.unwrap();

        assert_eq!(worker.state(), WorkerState::Activated);
        let outcome = worker
            .handle_fetch(&FetchRequest::get(url("/images/a.png")))
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::Respond { .. }));
    }

    #[tokio::test]
    async fn test_activation_failure_leaves_worker_redundant() {
        let storage = Arc::new(FlakyStorage::new(None, true));
        storage.inner.open("inkwell-cache-v0").await.unwrap();
        let worker = worker_over(online_network(), storage, DEFAULT_INSTALL_RETRY);

        let err = worker.install().await.unwrap_err();

        assert!(matches!(err, AssetCacheError::Cache(_)));
        assert_eq!(worker.state(), WorkerState::Redundant);
    }

    #[tokio::test]
    async fn test_failed_write_drops_new_store() {
        let storage = Arc::new(FlakyStorage::new(Some(2), false));
        let worker = worker_over(online_network(), storage.clone(), DEFAULT_INSTALL_RETRY);

        assert!(worker.install().await.is_err());

        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(!storage.has_cache(DEFAULT_CACHE_VERSION).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_write_evicts_entries_from_existing_store() {
        let storage = Arc::new(FlakyStorage::new(Some(2), false));
        storage.inner.open(DEFAULT_CACHE_VERSION).await.unwrap();
        storage
            .inner
            .put(DEFAULT_CACHE_VERSION, "https://avtor.bg/books", AssetResponse::new(200, "books"))
            .await
            .unwrap();
        let worker = worker_over(online_network(), storage.clone(), DEFAULT_INSTALL_RETRY);

        assert!(worker.install().await.is_err());

        let root = storage.lookup(DEFAULT_CACHE_VERSION, &url("/").to_string()).await.unwrap();
        assert!(root.is_none());
        let books = storage
            .lookup(DEFAULT_CACHE_VERSION, "https://avtor.bg/books")
            .await
            .unwrap();
        assert!(books.is_some());
    }

    #[tokio::test]
    async fn test_failed_install_retried_by_later_request() {
        let network = online_network();
        let worker = worker_over(network.clone(), Arc::new(MemoryCacheStorage::new(100)), Duration::ZERO);
        network.set_offline(true);
        assert!(worker.install().await.is_err());
        assert_eq!(worker.state(), WorkerState::Redundant);

        network.set_offline(false);
        let outcome = worker.handle_fetch(&FetchRequest::navigate(url("/"))).await.unwrap();

        assert_eq!(worker.state(), WorkerState::Activated);
        assert!(matches!(outcome, FetchOutcome::Respond { .. }));
    }

    #[tokio::test]
    async fn test_install_retry_waits_for_interval() {
        let network = online_network();
        let worker = worker_over(
            network.clone(),
            Arc::new(MemoryCacheStorage::new(100)),
            Duration::from_secs(3600),
        );
        network.set_offline(true);
        assert!(worker.install().await.is_err());

        network.set_offline(false);
        let outcome = worker.handle_fetch(&FetchRequest::navigate(url("/"))).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::PassThrough));
        assert_eq!(worker.state(), WorkerState::Redundant);
    }

    #[tokio::test]
    async fn test_unregistered_worker_not_reinstalled() {
        let network = online_network();
        let worker = worker_over(network.clone(), Arc::new(MemoryCacheStorage::new(100)), Duration::ZERO);
        worker.install().await.unwrap();
        worker.unregister().await.unwrap();
        let fetches = network.total_fetches();

        let outcome = worker.handle_fetch(&FetchRequest::navigate(url("/"))).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::PassThrough));
        assert_eq!(network.total_fetches(), fetches);
    }

    #[tokio::test]
    async fn test_unregister_purges_everything() {
        let fx = installed().await;
        let purged = fx.worker.unregister().await.unwrap();

        assert_eq!(purged, 1);
        assert!(fx.caches.cache_names().await.unwrap().is_empty());
        assert_eq!(fx.worker.state(), WorkerState::Redundant);
    }
}
