//! Map service lifecycle.
//!
//! Wires loader, cache and query engine together and runs the IPC
//! server on a dedicated thread. Shutdown is cooperative: an atomic flag
//! checked every receive-timeout, no process globals and no signal
//! handler state.

use crate::cache::TileCacheManager;
use crate::geo::{BoundingBox, Point};
use crate::graph::{MapEdge, MapNode};
use crate::ipc::server::run_server;
use crate::ipc::MessageTransport;
use crate::service::{GraphData, QueryEngine, ServiceConfig, ServiceError};
use crate::tile::TileLoader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Lifecycle states of the map service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Not initialized, or stopped again.
    Stopped,
    /// `initialize` in progress.
    Initializing,
    /// IPC thread is serving requests.
    Running,
}

/// Top-level orchestrator: owns the query engine and the IPC thread.
///
/// Lifecycle is `Stopped → Initializing → Running → Stopped`. Dropping a
/// running service stops it.
pub struct MapService {
    config: ServiceConfig,
    engine: Option<Arc<QueryEngine>>,
    state: ServiceState,
    shutdown: Arc<AtomicBool>,
    ipc_thread: Option<JoinHandle<()>>,
}

impl MapService {
    /// Create a service in the `Stopped` state.
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            engine: None,
            state: ServiceState::Stopped,
            shutdown: Arc::new(AtomicBool::new(false)),
            ipc_thread: None,
        }
    }

    /// Load map data and build the query engine.
    ///
    /// A missing index file selects the synthetic demonstration dataset
    /// (logged by the loader). Failure leaves the service `Stopped` and
    /// is reported to the caller; there is no automatic retry.
    pub fn initialize(&mut self) -> Result<(), ServiceError> {
        self.state = ServiceState::Initializing;

        let loader = match TileLoader::load(self.config.data_path.as_deref()) {
            Ok(loader) => Arc::new(loader),
            Err(e) => {
                self.state = ServiceState::Stopped;
                return Err(e.into());
            }
        };

        info!(
            tiles = loader.tile_count(),
            synthetic = loader.is_synthetic(),
            cache_capacity = self.config.cache_capacity,
            "map service initialized"
        );

        let cache = TileCacheManager::new(loader, self.config.cache_capacity);
        self.engine = Some(Arc::new(QueryEngine::new(
            cache,
            self.config.search_radius_m,
        )));
        self.state = ServiceState::Stopped;
        Ok(())
    }

    /// Spawn the IPC server thread.
    ///
    /// Idempotent: starting a running service drops the extra transport
    /// and returns `Ok`. Requires a prior successful `initialize`.
    pub fn start(&mut self, transport: Box<dyn MessageTransport>) -> Result<(), ServiceError> {
        if self.state == ServiceState::Running {
            warn!("map service already running, ignoring start");
            return Ok(());
        }
        let engine = Arc::clone(self.engine.as_ref().ok_or(ServiceError::NotInitialized)?);

        self.shutdown.store(false, Ordering::Relaxed);
        let shutdown = Arc::clone(&self.shutdown);
        let poll_interval = self.config.poll_interval;

        let handle = thread::Builder::new()
            .name("navtile-ipc".to_string())
            .spawn(move || {
                run_server(engine, transport, shutdown, poll_interval);
            })
            .map_err(ServiceError::ThreadSpawn)?;

        self.ipc_thread = Some(handle);
        self.state = ServiceState::Running;
        info!("map service started");
        Ok(())
    }

    /// Signal the IPC thread to exit and wait for it.
    ///
    /// Idempotent: stopping a stopped service is a no-op. Shutdown
    /// latency is bounded by the configured poll interval.
    pub fn stop(&mut self) {
        if self.state != ServiceState::Running && self.ipc_thread.is_none() {
            return;
        }
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.ipc_thread.take() {
            if let Err(e) = handle.join() {
                warn!("IPC thread panicked: {:?}", e);
            }
        }
        self.state = ServiceState::Stopped;
        info!("map service stopped");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Whether the IPC thread is serving requests.
    pub fn is_running(&self) -> bool {
        self.state == ServiceState::Running
            && self
                .ipc_thread
                .as_ref()
                .map(|h| !h.is_finished())
                .unwrap_or(false)
    }

    /// The query engine, for in-process callers.
    pub fn engine(&self) -> Result<&Arc<QueryEngine>, ServiceError> {
        self.engine.as_ref().ok_or(ServiceError::NotInitialized)
    }

    // Query pass-throughs for in-process callers. All of these may be
    // invoked concurrently with the IPC thread.

    /// See [`QueryEngine::nodes_in_bounding_box`].
    pub fn nodes_in_bounding_box(&self, bbox: &BoundingBox) -> Result<Vec<MapNode>, ServiceError> {
        Ok(self.engine()?.nodes_in_bounding_box(bbox))
    }

    /// See [`QueryEngine::edges_in_bounding_box`].
    pub fn edges_in_bounding_box(
        &self,
        bbox: &BoundingBox,
    ) -> Result<(Vec<MapEdge>, u64), ServiceError> {
        Ok(self.engine()?.edges_in_bounding_box(bbox))
    }

    /// See [`QueryEngine::map_graph_data`].
    pub fn map_graph_data(&self, bbox: &BoundingBox) -> Result<GraphData, ServiceError> {
        Ok(self.engine()?.map_graph_data(bbox))
    }

    /// See [`QueryEngine::find_closest_node`].
    pub fn find_closest_node(&self, position: &Point) -> Result<MapNode, ServiceError> {
        Ok(self.engine()?.find_closest_node(position))
    }

    /// See [`QueryEngine::node_by_id`].
    pub fn node_by_id(&self, node_id: u64) -> Result<Option<MapNode>, ServiceError> {
        Ok(self.engine()?.node_by_id(node_id))
    }

    /// See [`QueryEngine::connected_edges`].
    pub fn connected_edges(&self, node_id: u64) -> Result<Vec<MapEdge>, ServiceError> {
        Ok(self.engine()?.connected_edges(node_id))
    }

    /// See [`QueryEngine::preload_tiles`].
    pub fn preload_tiles(&self, bbox: &BoundingBox) -> Result<usize, ServiceError> {
        Ok(self.engine()?.preload_tiles(bbox))
    }

    /// See [`QueryEngine::clear_cache`].
    pub fn clear_cache(&self) -> Result<(), ServiceError> {
        self.engine()?.clear_cache();
        Ok(())
    }
}

impl Drop for MapService {
    fn drop(&mut self) {
        self.stop();
    }
}
