//! Application configuration.

use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::args::CliArgs;
use super::storage::ConfigError;
use crate::application::services::AssetCacheConfig;
use crate::application::services::asset_cache::{
    DEFAULT_CACHE_VERSION, DEFAULT_INSTALL_RETRY, DEFAULT_PLACEHOLDER,
};
use crate::application::use_cases::DEFAULT_STORAGE_PREFIX;
use crate::domain::entities::{DEFAULT_MAX_DIMENSION, Environment, SecretKey};
use crate::infrastructure::cache::{DEFAULT_CACHE_SIZE, DEFAULT_MAX_CACHE_SIZE};
use crate::infrastructure::image::DEFAULT_AVIF_SPEED;

const APP_NAME: &str = "inkwell";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from TOML and overridden by CLI/env.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path. Logs go to stderr when unset.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Build environment.
    #[serde(default)]
    pub environment: Environment,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Public site settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Supabase project settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,

    /// Image proxy settings.
    #[serde(default)]
    pub images: ImagesConfig,

    /// Asset cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Stripe publishable key. Accepted from the environment; checkout runs
    /// elsewhere.
    #[serde(skip)]
    pub stripe_publishable_key: Option<String>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origin served through the asset cache. Edge mode is off when unset.
    #[serde(default)]
    pub origin: Option<String>,

    /// Outbound request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            origin: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

/// Public site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute base URL used to resolve site-local image paths.
    #[serde(default = "default_site_url")]
    pub url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: default_site_url(),
        }
    }
}

/// Supabase project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Public anon key.
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Prefix marking storage-backed image sources.
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,

    /// Service-role key. Only ever read from the environment.
    #[serde(skip)]
    pub service_role_key: Option<SecretKey>,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            storage_prefix: default_storage_prefix(),
            service_role_key: None,
        }
    }
}

/// Image proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Largest accepted width or height.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// AVIF encoder speed, 1-10.
    #[serde(default = "default_avif_speed")]
    pub avif_speed: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            avif_speed: default_avif_speed(),
        }
    }
}

/// Where cached responses live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-memory LRU stores.
    Memory,
    /// Disk stores under the cache directory.
    #[default]
    Disk,
}

impl CacheBackend {
    /// Returns true if stores outlive the process, so another process can
    /// purge them.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        matches!(self, Self::Disk)
    }
}

/// Asset cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Register the asset cache in production.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Current cache store name.
    #[serde(default = "default_cache_version")]
    pub version: String,

    /// Paths fetched on install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Placeholder image path.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Storage backend.
    #[serde(default)]
    pub backend: CacheBackend,

    /// Disk cache directory override.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Disk cache size limit in bytes.
    #[serde(default = "default_max_disk_size")]
    pub max_disk_size: u64,

    /// Entries per in-memory store.
    #[serde(default = "default_memory_entries")]
    pub memory_entries: usize,

    /// Seconds to wait before a failed install is retried.
    #[serde(default = "default_install_retry_secs")]
    pub install_retry_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            version: default_cache_version(),
            precache: default_precache(),
            placeholder: default_placeholder(),
            backend: CacheBackend::default(),
            dir: None,
            max_disk_size: default_max_disk_size(),
            memory_entries: default_memory_entries(),
            install_retry_secs: default_install_retry_secs(),
        }
    }
}

impl CacheConfig {
    /// Builds the asset cache configuration.
    #[must_use]
    pub fn asset_cache_config(&self) -> AssetCacheConfig {
        AssetCacheConfig {
            cache_version: self.version.clone(),
            precache: self.precache.clone(),
            placeholder: self.placeholder.clone(),
            install_retry: Duration::from_secs(self.install_retry_secs),
            ..AssetCacheConfig::default()
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

const fn default_timeout() -> u64 {
    30
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_storage_prefix() -> String {
    DEFAULT_STORAGE_PREFIX.to_string()
}

const fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

const fn default_avif_speed() -> u8 {
    DEFAULT_AVIF_SPEED
}

fn default_cache_version() -> String {
    DEFAULT_CACHE_VERSION.to_string()
}

fn default_precache() -> Vec<String> {
    AssetCacheConfig::default().precache
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

const fn default_max_disk_size() -> u64 {
    DEFAULT_MAX_CACHE_SIZE
}

const fn default_memory_entries() -> usize {
    DEFAULT_CACHE_SIZE
}

const fn default_install_retry_secs() -> u64 {
    DEFAULT_INSTALL_RETRY.as_secs()
}

const fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Merges CLI arguments and their environment fallbacks into the
    /// configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(environment) = args.environment {
            self.environment = environment;
        }
        if let Some(bind) = &args.bind {
            self.server.bind.clone_from(bind);
        }
        if let Some(origin) = &args.origin {
            self.server.origin = Some(origin.clone());
        }
        if let Some(site_url) = &args.site_url {
            self.site.url.clone_from(site_url);
        }
        if let Some(url) = &args.supabase_url {
            self.supabase.url = Some(url.clone());
        }
        if let Some(key) = &args.supabase_anon_key {
            self.supabase.anon_key = Some(key.clone());
        }
        if let Some(key) = args.supabase_service_role_key.as_deref().and_then(SecretKey::new) {
            self.supabase.service_role_key = Some(key);
        }
        if let Some(key) = &args.stripe_publishable_key {
            self.stripe_publishable_key = Some(key.clone());
        }
        if let Some(enabled) = args.cache_enabled {
            self.cache.enabled = enabled;
        }
        if let Some(dir) = &args.cache_dir {
            self.cache.dir = Some(dir.clone());
        }
    }

    /// Parses the site base URL.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidUrl` if it is not an absolute URL.
    pub fn site_url(&self) -> Result<Url, ConfigError> {
        parse_url("site.url", &self.site.url)
    }

    /// Parses the edge origin, if configured.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidUrl` if it is not an absolute URL.
    pub fn origin_url(&self) -> Result<Option<Url>, ConfigError> {
        self.server
            .origin
            .as_deref()
            .map(|origin| parse_url("server.origin", origin))
            .transpose()
    }

    /// Parses the Supabase project URL, if configured.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidUrl` if it is not an absolute URL.
    pub fn supabase_url(&self) -> Result<Option<Url>, ConfigError> {
        self.supabase
            .url
            .as_deref()
            .map(|url| parse_url("supabase.url", url))
            .transpose()
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field,
        message: format!("'{value}': {e}"),
    })
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            environment: Environment::default(),
            server: ServerConfig::default(),
            site: SiteConfig::default(),
            supabase: SupabaseConfig::default(),
            images: ImagesConfig::default(),
            cache: CacheConfig::default(),
            stripe_publishable_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
            log_level = "debug"
            environment = "development"

            [server]
            origin = "http://127.0.0.1:4000"

            [site]
            url = "https://avtor.bg"

            [cache]
            version = "inkwell-cache-v2"
            backend = "memory"
            precache = ["/", "/offline"]
            install_retry_secs = 5
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.site_url().unwrap().as_str(), "https://avtor.bg/");
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(config.cache.enabled);

        let asset = config.cache.asset_cache_config();
        assert_eq!(asset.cache_version, "inkwell-cache-v2");
        assert_eq!(asset.precache, vec!["/", "/offline"]);
        assert_eq!(asset.placeholder, DEFAULT_PLACEHOLDER);
        assert_eq!(asset.install_retry, Duration::from_secs(5));
    }

    #[test]
    fn test_only_disk_backend_is_persistent() {
        assert!(CacheBackend::Disk.is_persistent());
        assert!(!CacheBackend::Memory.is_persistent());
        assert_eq!(
            CacheConfig::default().asset_cache_config().install_retry,
            DEFAULT_INSTALL_RETRY
        );
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.images.max_dimension, DEFAULT_MAX_DIMENSION);
        assert_eq!(config.supabase.storage_prefix, "supabase://");
        assert_eq!(config.cache.version, DEFAULT_CACHE_VERSION);
        assert!(config.origin_url().unwrap().is_none());
    }

    #[test]
    fn test_secrets_never_serialized() {
        let mut config = AppConfig::default();
        config.supabase.service_role_key = SecretKey::new("service-role-secret");
        config.stripe_publishable_key = Some("pk_test_123".to_string());

        let content = toml::to_string(&config).unwrap();
        assert!(!content.contains("service-role-secret"));
        assert!(!content.contains("pk_test_123"));
    }

    #[test]
    fn test_merge_with_args() {
        let args = CliArgs::try_parse_from([
            "inkwell",
            "--site-url",
            "https://example.bg",
            "--supabase-service-role-key",
            "secret-key-value",
            "--cache-enabled",
            "false",
            "serve",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        config.merge_with_args(&args);

        assert_eq!(config.site.url, "https://example.bg");
        assert_eq!(
            config.supabase.service_role_key.as_ref().map(SecretKey::expose),
            Some("secret-key-value")
        );
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = AppConfig::default();
        config.site.url = "not a url".to_string();
        assert!(matches!(
            config.site_url(),
            Err(ConfigError::InvalidUrl { field: "site.url", .. })
        ));
    }
}
