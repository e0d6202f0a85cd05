//! Cache-aware tile access.
//!
//! Presents "get a tile by id" as one idempotent operation. A single
//! mutex spans the whole check-cache-then-load sequence, so concurrent
//! requests for the same tile serialize instead of racing to double-load.
//! That also serializes loads for *different* tiles — an accepted
//! trade-off, since tile decode is fast relative to IPC latency.

use crate::cache::LruCache;
use crate::geo::BoundingBox;
use crate::tile::{MapTile, TileLoader};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Thread-safe, bounded front for the [`TileLoader`].
///
/// Tiles are handed out as `Arc<MapTile>`: eviction drops the cache's
/// reference, not the caller's, so a reader holding a tile is never
/// invalidated by concurrent eviction.
pub struct TileCacheManager {
    loader: Arc<TileLoader>,
    cache: Mutex<LruCache<u64, Arc<MapTile>>>,
}

impl TileCacheManager {
    /// Create a manager over a loader with the given tile capacity.
    pub fn new(loader: Arc<TileLoader>, capacity: usize) -> Self {
        Self {
            loader,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fetch a tile, loading and caching it on a miss.
    ///
    /// A cache hit refreshes the tile's last-access stamp. A load failure
    /// (unknown id, backend error) returns `None`; unknown ids are an
    /// expected outcome of queries against incomplete data, not a fault.
    pub fn get_tile(&self, tile_id: u64) -> Option<Arc<MapTile>> {
        let mut cache = self.cache.lock().unwrap();

        if let Some(tile) = cache.get(&tile_id) {
            tile.touch();
            return Some(Arc::clone(tile));
        }

        match self.loader.load_tile(tile_id) {
            Ok(tile) => {
                let tile = Arc::new(tile);
                cache.put(tile_id, Arc::clone(&tile));
                Some(tile)
            }
            Err(e) => {
                debug!(tile_id, error = %e, "tile load failed");
                None
            }
        }
    }

    /// Warm the cache for every tile intersecting the box.
    ///
    /// Best-effort: per-tile failures are swallowed. Returns the number
    /// of tiles fetched successfully.
    pub fn preload_tiles(&self, bbox: &BoundingBox) -> usize {
        let ids = self.loader.tiles_intersecting(bbox);
        let total = ids.len();
        let loaded = ids
            .into_iter()
            .filter(|&id| self.get_tile(id).is_some())
            .count();
        debug!(requested = total, loaded, %bbox, "tile preload finished");
        loaded
    }

    /// Drop every cached tile.
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear();
    }

    /// Number of tiles currently cached.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    /// Whether a tile is currently cached, without touching recency.
    pub fn contains(&self, tile_id: u64) -> bool {
        self.cache.lock().unwrap().contains(&tile_id)
    }

    /// The loader backing this manager.
    pub fn loader(&self) -> &Arc<TileLoader> {
        &self.loader
    }
}
