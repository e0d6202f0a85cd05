//! Tile model, on-disk index and loader.
//!
//! A tile is a fixed geographic cell holding a slice of the road-network
//! graph. The [`TileLoader`] owns the authoritative mapping from tile id
//! to bounds and backend location; decoded [`MapTile`]s are shared
//! read-only via `Arc` once published.

mod error;
pub(crate) mod index;
mod loader;

pub use error::TileError;
pub use loader::TileLoader;

use crate::geo::BoundingBox;
use crate::graph::{MapEdge, MapNode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A decoded geographic tile.
///
/// The node and edge lists never change after the tile is marked loaded;
/// only the last-access stamp is updated, which is why it is the sole
/// interior-mutable field. The cache may evict a tile while callers still
/// hold an `Arc` to it — the handle keeps the data alive.
#[derive(Debug)]
pub struct MapTile {
    /// Index-wide unique tile id.
    pub tile_id: u64,
    /// Geographic extent of the tile.
    pub bounds: BoundingBox,
    /// Nodes owned by this tile.
    pub nodes: Vec<MapNode>,
    /// Edges owned by this tile; endpoints may lie in other tiles.
    pub edges: Vec<MapEdge>,
    /// Whether decoding completed.
    pub loaded: bool,
    /// Unix seconds of the last cache access.
    last_access: AtomicU64,
}

impl MapTile {
    /// Create a loaded tile from decoded content.
    pub fn new(tile_id: u64, bounds: BoundingBox, nodes: Vec<MapNode>, edges: Vec<MapEdge>) -> Self {
        let tile = Self {
            tile_id,
            bounds,
            nodes,
            edges,
            loaded: true,
            last_access: AtomicU64::new(0),
        };
        tile.touch();
        tile
    }

    /// Refresh the last-access stamp to the current time.
    pub fn touch(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.last_access.store(now, Ordering::Relaxed);
    }

    /// Unix seconds of the most recent cache access.
    pub fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;
    use crate::graph::NodeType;

    #[test]
    fn test_new_tile_is_loaded_and_stamped() {
        let bounds = BoundingBox::new(21.0, 105.8, 21.001, 105.801);
        let node = MapNode::new(1000, Point::new(21.0005, 105.8005), NodeType::Waypoint);
        let tile = MapTile::new(1, bounds, vec![node], vec![]);

        assert!(tile.loaded);
        assert_eq!(tile.tile_id, 1);
        assert_eq!(tile.nodes.len(), 1);
        assert!(tile.last_access() > 0);
    }

    #[test]
    fn test_touch_updates_stamp() {
        let bounds = BoundingBox::new(21.0, 105.8, 21.001, 105.801);
        let tile = MapTile::new(1, bounds, vec![], vec![]);
        let before = tile.last_access();
        tile.touch();
        assert!(tile.last_access() >= before);
    }
}
