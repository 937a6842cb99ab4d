//! Shared handler state.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Url;

use crate::application::services::AssetCache;
use crate::application::use_cases::OptimizeImageUseCase;
use crate::domain::ports::NetworkPort;

/// Asset cache sitting in front of an origin site.
pub struct EdgeProxy {
    /// Cache dispatching requests for the origin.
    pub cache: Arc<AssetCache>,
    /// Origin base URL.
    pub origin: Url,
    /// Network used for pass-through requests.
    pub network: Arc<dyn NetworkPort>,
}

/// State shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Image optimization use case.
    pub optimizer: Arc<OptimizeImageUseCase>,
    /// Edge proxy, when an origin is configured.
    pub edge: Option<Arc<EdgeProxy>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates state without edge mode.
    #[must_use]
    pub fn new(optimizer: OptimizeImageUseCase) -> Self {
        Self {
            optimizer: Arc::new(optimizer),
            edge: None,
            start_time: Instant::now(),
        }
    }

    /// Enables edge mode.
    #[must_use]
    pub fn with_edge(mut self, edge: EdgeProxy) -> Self {
        self.edge = Some(Arc::new(edge));
        self
    }

    /// Seconds since the server started.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
