//! Conditional asset cache registration.

use tracing::{info, warn};

use crate::domain::entities::Environment;
use crate::domain::errors::AssetCacheError;

use super::asset_cache::AssetCache;

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Installed and activated.
    Registered,
    /// Skipped because this is not a production build.
    SkippedDevelopment,
    /// Skipped because caching is disabled in configuration.
    SkippedDisabled,
}

/// Installs and activates the cache when running a production build with
/// caching enabled. A failed install is retried by later requests, the way
/// a browser registers again on the next page load.
///
/// # Errors
/// Returns the install or activation error.
pub async fn register(
    cache: &AssetCache,
    environment: Environment,
    enabled: bool,
) -> Result<Registration, AssetCacheError> {
    if environment != Environment::Production {
        info!(%environment, "Asset cache registration skipped outside production");
        return Ok(Registration::SkippedDevelopment);
    }
    if !enabled {
        info!("Asset cache disabled in configuration");
        return Ok(Registration::SkippedDisabled);
    }

    cache.install().await.inspect_err(|e| {
        warn!(error = %e, "Asset cache registration failed");
    })?;
    Ok(Registration::Registered)
}

/// Retires the cache and purges all of its stores.
///
/// # Errors
/// Returns a cache error if stores cannot be deleted.
pub async fn unregister(cache: &AssetCache) -> Result<usize, AssetCacheError> {
    cache.unregister().await
}
