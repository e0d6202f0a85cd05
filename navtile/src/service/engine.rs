//! Spatial query engine.
//!
//! Resolves bounding-box and nearest-node queries against the cached
//! tile set, and maintains the derived lookup indices (`node id → node`,
//! `node id → incident edges`).
//!
//! # Derived index lifetime
//!
//! The derived indices are populated lazily, as tiles are touched by
//! bounding-box queries, and grow monotonically: entries survive the
//! eviction of the tile that produced them. A set of already-indexed
//! tile ids guarantees each tile contributes exactly once, so a tile
//! that is evicted and later reloaded cannot duplicate incidence
//! entries. `node_by_id`/`connected_edges` therefore only see data from
//! tiles some query has already processed — a documented trade-off, not
//! a bug.

use crate::cache::TileCacheManager;
use crate::geo::{haversine_distance, BoundingBox, Point};
use crate::graph::{MapEdge, MapNode};
use crate::tile::{MapTile, TileLoader};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Combined result of a graph-data query.
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    /// Nodes inside the query box.
    pub nodes: Vec<MapNode>,
    /// Edges with a resolvable endpoint inside the query box.
    pub edges: Vec<MapEdge>,
    /// Edges excluded because no endpoint could be resolved.
    pub dropped_edges: u64,
}

impl GraphData {
    /// Whether the query found neither nodes nor edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Answers spatial queries over the cached tile set.
pub struct QueryEngine {
    cache: TileCacheManager,
    search_radius_m: f64,
    /// Derived lookup: node id to node.
    node_index: DashMap<u64, MapNode>,
    /// Derived lookup: node id to incident edges (both directions).
    incidence: DashMap<u64, Vec<MapEdge>>,
    /// Tiles whose content has been folded into the derived indices.
    indexed_tiles: DashSet<u64>,
    /// Cumulative count of edges dropped for unresolvable endpoints.
    dropped_edges: AtomicU64,
}

impl QueryEngine {
    /// Create an engine over a cache manager.
    pub fn new(cache: TileCacheManager, search_radius_m: f64) -> Self {
        Self {
            cache,
            search_radius_m,
            node_index: DashMap::new(),
            incidence: DashMap::new(),
            indexed_tiles: DashSet::new(),
            dropped_edges: AtomicU64::new(0),
        }
    }

    /// The loader backing the engine's cache.
    pub fn loader(&self) -> &Arc<TileLoader> {
        self.cache.loader()
    }

    /// All nodes inside the box, across every intersecting tile.
    pub fn nodes_in_bounding_box(&self, bbox: &BoundingBox) -> Vec<MapNode> {
        let mut nodes = Vec::new();
        for tile in self.tiles_for(bbox) {
            nodes.extend(tile.nodes.iter().filter(|n| bbox.contains(&n.position)));
        }
        trace!(%bbox, count = nodes.len(), "nodes-in-bbox query");
        nodes
    }

    /// All edges with a resolvable endpoint inside the box.
    ///
    /// An edge is included when at least one endpoint resolves through
    /// the derived node index *and* that endpoint lies inside the box.
    /// Edges with no resolvable endpoint are dropped; the per-query drop
    /// count is returned and added to [`Self::dropped_edge_count`].
    pub fn edges_in_bounding_box(&self, bbox: &BoundingBox) -> (Vec<MapEdge>, u64) {
        let mut edges = Vec::new();
        let mut dropped = 0u64;

        for tile in self.tiles_for(bbox) {
            for edge in &tile.edges {
                let from = self.node_index.get(&edge.from_node).map(|n| n.position);
                let to = self.node_index.get(&edge.to_node).map(|n| n.position);

                if from.is_none() && to.is_none() {
                    dropped += 1;
                    continue;
                }
                let from_inside = from.map(|p| bbox.contains(&p)).unwrap_or(false);
                let to_inside = to.map(|p| bbox.contains(&p)).unwrap_or(false);
                if from_inside || to_inside {
                    edges.push(*edge);
                }
            }
        }

        if dropped > 0 {
            self.dropped_edges.fetch_add(dropped, Ordering::Relaxed);
            debug!(%bbox, dropped, "edges dropped for unresolvable endpoints");
        }
        (edges, dropped)
    }

    /// Nodes and edges inside the box in one call.
    pub fn map_graph_data(&self, bbox: &BoundingBox) -> GraphData {
        let nodes = self.nodes_in_bounding_box(bbox);
        let (edges, dropped_edges) = self.edges_in_bounding_box(bbox);
        GraphData {
            nodes,
            edges,
            dropped_edges,
        }
    }

    /// The node closest to `position` within the configured search
    /// radius, by great-circle distance.
    ///
    /// Returns the sentinel node (id 0) when no node qualifies; callers
    /// must treat id 0 as "not found".
    pub fn find_closest_node(&self, position: &Point) -> MapNode {
        let search_box = BoundingBox::around(position, self.search_radius_m);
        let mut best: Option<(MapNode, f64)> = None;

        for node in self.nodes_in_bounding_box(&search_box) {
            let distance = haversine_distance(position, &node.position);
            if distance > self.search_radius_m {
                continue;
            }
            if best.map(|(_, d)| distance < d).unwrap_or(true) {
                best = Some((node, distance));
            }
        }

        match best {
            Some((node, distance)) => {
                trace!(node_id = node.id, distance_m = distance, "closest node found");
                node
            }
            None => MapNode::sentinel(*position),
        }
    }

    /// Point lookup into the derived node index.
    ///
    /// Only populated for tiles a bounding-box query has processed; a
    /// miss does not trigger a tile scan.
    pub fn node_by_id(&self, node_id: u64) -> Option<MapNode> {
        self.node_index.get(&node_id).map(|n| *n)
    }

    /// Edges incident to a node, from the derived incidence index.
    pub fn connected_edges(&self, node_id: u64) -> Vec<MapEdge> {
        self.incidence
            .get(&node_id)
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Warm the tile cache for an anticipated query region.
    pub fn preload_tiles(&self, bbox: &BoundingBox) -> usize {
        self.cache.preload_tiles(bbox)
    }

    /// Drop all cached tiles. The derived indices are kept (see module
    /// docs on index lifetime).
    pub fn clear_cache(&self) {
        self.cache.clear_cache();
    }

    /// Cumulative number of edges dropped across all queries.
    pub fn dropped_edge_count(&self) -> u64 {
        self.dropped_edges.load(Ordering::Relaxed)
    }

    /// Fetch every tile intersecting the box and fold each into the
    /// derived indices before returning it.
    fn tiles_for(&self, bbox: &BoundingBox) -> Vec<Arc<MapTile>> {
        self.loader()
            .tiles_intersecting(bbox)
            .into_iter()
            .filter_map(|id| self.cache.get_tile(id))
            .inspect(|tile| self.index_tile(tile))
            .collect()
    }

    /// Fold a tile's nodes and edges into the derived indices, exactly
    /// once per tile id.
    fn index_tile(&self, tile: &MapTile) {
        if !self.indexed_tiles.insert(tile.tile_id) {
            return;
        }
        for node in &tile.nodes {
            self.node_index.insert(node.id, *node);
        }
        for edge in &tile.edges {
            self.incidence.entry(edge.from_node).or_default().push(*edge);
            if edge.to_node != edge.from_node {
                self.incidence.entry(edge.to_node).or_default().push(*edge);
            }
        }
        trace!(
            tile_id = tile.tile_id,
            nodes = tile.nodes.len(),
            edges = tile.edges.len(),
            "tile folded into derived indices"
        );
    }
}
