//! Map service configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for [`super::MapService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path to the persisted tile index. `None` (or a missing file)
    /// selects the synthetic demonstration dataset.
    pub data_path: Option<PathBuf>,
    /// Maximum number of decoded tiles held in memory (default: 32).
    pub cache_capacity: usize,
    /// Nearest-node search radius in meters (default: 500).
    pub search_radius_m: f64,
    /// How long the IPC thread blocks per receive before re-checking the
    /// shutdown flag (default: 100 ms). This bounds shutdown latency.
    pub poll_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            cache_capacity: 32,
            search_radius_m: 500.0,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ServiceConfig {
    /// Set the tile index path.
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Set the tile cache capacity in entries.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the nearest-node search radius in meters.
    pub fn with_search_radius_m(mut self, radius_m: f64) -> Self {
        self.search_radius_m = radius_m;
        self
    }
}
