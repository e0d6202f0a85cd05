//! Tile index ownership and on-demand tile materialization.
//!
//! The loader reads a persisted index at startup and decodes one tile's
//! nodes and edges at a time from the sibling data file. When no index
//! file is configured or present it falls back to a deterministic
//! synthetic dataset covering a fixed demonstration region; the fallback
//! is logged loudly because it changes the answer to every query.

use crate::geo::{haversine_distance, BoundingBox, Point};
use crate::graph::{MapEdge, MapNode, NodeType, RoadType, NODE_ID_STRIDE};
use crate::tile::index::{decode_index, TileIndexEntry};
use crate::tile::{MapTile, TileError};
use bytes::Buf;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// South-west corner of the synthetic demonstration region.
const SYNTHETIC_ORIGIN_LAT: f64 = 21.0;
const SYNTHETIC_ORIGIN_LON: f64 = 105.8;

/// The synthetic region is a square grid of this many tiles per side.
const SYNTHETIC_GRID_DIM: u64 = 4;

/// Edge length of one synthetic tile in degrees.
const SYNTHETIC_TILE_SPAN_DEG: f64 = 0.001;

/// Synthetic tiles carry a square node grid of this many nodes per side,
/// placed at the 1/4, 2/4 and 3/4 fractions of the tile span so nodes
/// stay strictly inside the tile bounds.
const SYNTHETIC_NODE_GRID: usize = 3;

/// Synthetic edges connect every node pair closer than this distance.
const SYNTHETIC_EDGE_THRESHOLD_M: f64 = 40.0;

/// Serialized size of one node record in a tile blob.
const NODE_RECORD_SIZE: usize = 1 + 8 + 8;
/// Serialized size of one edge record in a tile blob.
const EDGE_RECORD_SIZE: usize = 8 + 8 + 4 + 1 + 2 + 4;

/// Owns the authoritative tile index and materializes tile contents.
pub struct TileLoader {
    /// All index entries, scan order.
    index: Vec<TileIndexEntry>,
    /// Tile id to position in `index`.
    by_id: HashMap<u64, usize>,
    /// Data file holding the tile blobs (absent in synthetic mode).
    data_path: Option<PathBuf>,
    /// Whether the index was synthesized rather than read from disk.
    synthetic: bool,
    /// Number of successful tile loads, for cache observability.
    loads: AtomicU64,
}

impl TileLoader {
    /// Load the tile index.
    ///
    /// When `path` is `None`, or names a file that does not exist, the
    /// loader synthesizes a deterministic index over the demonstration
    /// region and logs a warning — operators must be able to tell a demo
    /// run from a real-data run. A file that exists but cannot be parsed
    /// is an error, not a fallback.
    pub fn load(path: Option<&Path>) -> Result<Self, TileError> {
        match path {
            Some(p) if p.exists() => {
                let bytes = std::fs::read(p)?;
                let index = decode_index(&bytes)?;
                let by_id = Self::build_id_map(&index)?;
                info!(
                    path = %p.display(),
                    tiles = index.len(),
                    "tile index loaded"
                );
                Ok(Self {
                    index,
                    by_id,
                    data_path: Some(p.with_extension("dat")),
                    synthetic: false,
                    loads: AtomicU64::new(0),
                })
            }
            other => {
                match other {
                    Some(p) => warn!(
                        path = %p.display(),
                        "tile index not found, falling back to synthetic demonstration data"
                    ),
                    None => warn!(
                        "no tile index configured, falling back to synthetic demonstration data"
                    ),
                }
                let index = Self::synthetic_index();
                let by_id = Self::build_id_map(&index)?;
                info!(tiles = index.len(), "synthetic tile index built");
                Ok(Self {
                    index,
                    by_id,
                    data_path: None,
                    synthetic: true,
                    loads: AtomicU64::new(0),
                })
            }
        }
    }

    /// Whether the loader is serving synthetic demonstration data.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Number of tiles in the index.
    pub fn tile_count(&self) -> usize {
        self.index.len()
    }

    /// Number of successful tile loads since startup.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Every tile id whose bounds intersect the query box.
    ///
    /// Linear scan over the index; the contract is exactness (no false
    /// negatives or positives), not speed, and indexes at this scale stay
    /// small enough that a scan is fine.
    pub fn tiles_intersecting(&self, bbox: &BoundingBox) -> Vec<u64> {
        self.index
            .iter()
            .filter(|e| e.bounds.intersects(bbox))
            .map(|e| e.tile_id)
            .collect()
    }

    /// Bounds of a tile without decoding its content.
    pub fn tile_bounds(&self, tile_id: u64) -> Option<BoundingBox> {
        self.by_id.get(&tile_id).map(|&i| self.index[i].bounds)
    }

    /// Decode (or synthesize) the content of one tile.
    ///
    /// # Errors
    ///
    /// `TileError::TileNotFound` when the id is absent from the index;
    /// I/O and decode errors when the backend blob cannot be read.
    pub fn load_tile(&self, tile_id: u64) -> Result<MapTile, TileError> {
        let entry = self
            .by_id
            .get(&tile_id)
            .map(|&i| &self.index[i])
            .ok_or(TileError::TileNotFound(tile_id))?;

        let tile = if self.synthetic {
            self.synthesize_tile(tile_id, entry.bounds)
        } else {
            let (nodes, edges) = self.read_tile_blob(entry)?;
            MapTile::new(tile_id, entry.bounds, nodes, edges)
        };

        self.loads.fetch_add(1, Ordering::Relaxed);
        debug!(
            tile_id,
            nodes = tile.nodes.len(),
            edges = tile.edges.len(),
            "tile loaded"
        );
        Ok(tile)
    }

    /// Index entries must have unique tile ids.
    fn build_id_map(index: &[TileIndexEntry]) -> Result<HashMap<u64, usize>, TileError> {
        let mut by_id = HashMap::with_capacity(index.len());
        for (i, entry) in index.iter().enumerate() {
            if by_id.insert(entry.tile_id, i).is_some() {
                return Err(TileError::MalformedIndex(format!(
                    "duplicate tile id {}",
                    entry.tile_id
                )));
            }
        }
        Ok(by_id)
    }

    /// Read and decode one tile blob from the data file.
    fn read_tile_blob(
        &self,
        entry: &TileIndexEntry,
    ) -> Result<(Vec<MapNode>, Vec<MapEdge>), TileError> {
        let data_path = self.data_path.as_ref().ok_or_else(|| {
            TileError::MalformedIndex("no data file configured".to_string())
        })?;

        let mut file = File::open(data_path)?;
        file.seek(SeekFrom::Start(entry.offset))?;
        let mut blob = vec![0u8; entry.size as usize];
        file.read_exact(&mut blob)?;

        decode_tile_blob(entry.tile_id, &blob)
    }

    /// Build the synthetic index: a `SYNTHETIC_GRID_DIM`-square grid of
    /// `SYNTHETIC_TILE_SPAN_DEG` tiles from the demonstration origin.
    /// Tile ids start at 1 so no derived node id collides with the
    /// nearest-node sentinel.
    fn synthetic_index() -> Vec<TileIndexEntry> {
        let mut entries = Vec::with_capacity((SYNTHETIC_GRID_DIM * SYNTHETIC_GRID_DIM) as usize);
        for row in 0..SYNTHETIC_GRID_DIM {
            for col in 0..SYNTHETIC_GRID_DIM {
                let min_lat = SYNTHETIC_ORIGIN_LAT + row as f64 * SYNTHETIC_TILE_SPAN_DEG;
                let min_lon = SYNTHETIC_ORIGIN_LON + col as f64 * SYNTHETIC_TILE_SPAN_DEG;
                entries.push(TileIndexEntry {
                    tile_id: row * SYNTHETIC_GRID_DIM + col + 1,
                    bounds: BoundingBox::new(
                        min_lat,
                        min_lon,
                        min_lat + SYNTHETIC_TILE_SPAN_DEG,
                        min_lon + SYNTHETIC_TILE_SPAN_DEG,
                    ),
                    offset: 0,
                    size: 0,
                });
            }
        }
        entries
    }

    /// Generate deterministic demonstration content for one tile.
    ///
    /// Nodes sit on a fixed-step grid strictly inside the tile bounds
    /// with ids `tile_id * NODE_ID_STRIDE + k`; an edge plus its reverse
    /// is created for every node pair closer than the fixed threshold.
    /// Same tile id, same content — tests rely on that.
    fn synthesize_tile(&self, tile_id: u64, bounds: BoundingBox) -> MapTile {
        let step = SYNTHETIC_TILE_SPAN_DEG / (SYNTHETIC_NODE_GRID + 1) as f64;
        let center = SYNTHETIC_NODE_GRID / 2;

        let mut nodes = Vec::with_capacity(SYNTHETIC_NODE_GRID * SYNTHETIC_NODE_GRID);
        for i in 0..SYNTHETIC_NODE_GRID {
            for j in 0..SYNTHETIC_NODE_GRID {
                let k = (i * SYNTHETIC_NODE_GRID + j) as u64;
                let position = Point::new(
                    bounds.min_lat + (i + 1) as f64 * step,
                    bounds.min_lon + (j + 1) as f64 * step,
                );
                let node_type = if i == center && j == center {
                    NodeType::Junction
                } else {
                    NodeType::Waypoint
                };
                nodes.push(MapNode::new(
                    tile_id * NODE_ID_STRIDE + k,
                    position,
                    node_type,
                ));
            }
        }

        let mut edges = Vec::new();
        for a in 0..nodes.len() {
            for b in (a + 1)..nodes.len() {
                let length = haversine_distance(&nodes[a].position, &nodes[b].position);
                if length < SYNTHETIC_EDGE_THRESHOLD_M {
                    let edge = MapEdge::new(
                        nodes[a].id,
                        nodes[b].id,
                        length,
                        RoadType::Residential,
                        30,
                        0,
                    );
                    edges.push(edge);
                    edges.push(edge.reversed());
                }
            }
        }

        MapTile::new(tile_id, bounds, nodes, edges)
    }
}

/// Decode the node and edge lists of one tile blob.
fn decode_tile_blob(tile_id: u64, blob: &[u8]) -> Result<(Vec<MapNode>, Vec<MapEdge>), TileError> {
    let mut buf = blob;
    if buf.remaining() < 8 {
        return Err(TileError::MalformedTile {
            tile_id,
            reason: "missing count header".to_string(),
        });
    }
    let node_count = buf.get_u32_le() as usize;
    let edge_count = buf.get_u32_le() as usize;

    let expected = node_count * NODE_RECORD_SIZE + edge_count * EDGE_RECORD_SIZE;
    if buf.remaining() != expected {
        return Err(TileError::MalformedTile {
            tile_id,
            reason: format!(
                "expected {} payload bytes for {} nodes and {} edges, found {}",
                expected,
                node_count,
                edge_count,
                buf.remaining()
            ),
        });
    }

    let mut nodes = Vec::with_capacity(node_count);
    for k in 0..node_count {
        let node_type = NodeType::from_u8(buf.get_u8());
        let lat = buf.get_f64_le();
        let lon = buf.get_f64_le();
        nodes.push(MapNode::new(
            tile_id * NODE_ID_STRIDE + k as u64,
            Point::new(lat, lon),
            node_type,
        ));
    }

    let mut edges = Vec::with_capacity(edge_count);
    for _ in 0..edge_count {
        let from_node = buf.get_u64_le();
        let to_node = buf.get_u64_le();
        let length_m = buf.get_f32_le() as f64;
        let road_type = RoadType::from_u8(buf.get_u8());
        let speed_limit_kmh = buf.get_u16_le();
        let flags = buf.get_u32_le();
        edges.push(MapEdge::new(
            from_node,
            to_node,
            length_m,
            road_type,
            speed_limit_kmh,
            flags,
        ));
    }

    Ok((nodes, edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::index::encode_index;
    use bytes::BufMut;
    use tempfile::TempDir;

    /// Serialize a tile blob in the on-disk format.
    fn encode_blob(nodes: &[(u8, f64, f64)], edges: &[(u64, u64, f32, u8, u16, u32)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u32_le(nodes.len() as u32);
        out.put_u32_le(edges.len() as u32);
        for &(node_type, lat, lon) in nodes {
            out.put_u8(node_type);
            out.put_f64_le(lat);
            out.put_f64_le(lon);
        }
        for &(from, to, length, road, speed, flags) in edges {
            out.put_u64_le(from);
            out.put_u64_le(to);
            out.put_f32_le(length);
            out.put_u8(road);
            out.put_u16_le(speed);
            out.put_u32_le(flags);
        }
        out
    }

    /// Write an index plus data file holding two single-node tiles.
    fn write_two_tile_fixture(dir: &TempDir) -> std::path::PathBuf {
        let index_path = dir.path().join("tiles.idx");
        let data_path = dir.path().join("tiles.dat");

        let blob_a = encode_blob(
            &[(1, 21.0005, 105.8005)],
            &[(1000, 2000, 55.0, 1, 50, 0)],
        );
        let blob_b = encode_blob(&[(0, 21.0015, 105.8005)], &[]);

        let entries = vec![
            TileIndexEntry {
                tile_id: 1,
                bounds: BoundingBox::new(21.0, 105.8, 21.001, 105.801),
                offset: 0,
                size: blob_a.len() as u32,
            },
            TileIndexEntry {
                tile_id: 2,
                bounds: BoundingBox::new(21.001, 105.8, 21.002, 105.801),
                offset: blob_a.len() as u64,
                size: blob_b.len() as u32,
            },
        ];

        std::fs::write(&index_path, encode_index(&entries)).unwrap();
        let mut data = blob_a;
        data.extend_from_slice(&blob_b);
        std::fs::write(&data_path, data).unwrap();
        index_path
    }

    // ── Fallback behavior ────────────────────────────────────────────────

    #[test]
    fn test_no_path_falls_back_to_synthetic() {
        let loader = TileLoader::load(None).unwrap();
        assert!(loader.is_synthetic());
        assert_eq!(loader.tile_count(), 16);
    }

    #[test]
    fn test_missing_file_falls_back_to_synthetic() {
        let loader = TileLoader::load(Some(Path::new("/nonexistent/tiles.idx"))).unwrap();
        assert!(loader.is_synthetic());
    }

    #[test]
    fn test_malformed_index_is_an_error_not_a_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.idx");
        std::fs::write(&path, b"garbage").unwrap();

        let result = TileLoader::load(Some(&path));
        assert!(matches!(result, Err(TileError::MalformedIndex(_))));
    }

    // ── Index queries ────────────────────────────────────────────────────

    #[test]
    fn test_tiles_intersecting_exact_set() {
        let dir = TempDir::new().unwrap();
        let index_path = write_two_tile_fixture(&dir);
        let loader = TileLoader::load(Some(&index_path)).unwrap();
        assert!(!loader.is_synthetic());

        // Exactly tile 1.
        let hits = loader.tiles_intersecting(&BoundingBox::new(21.0002, 105.8002, 21.0004, 105.8004));
        assert_eq!(hits, vec![1]);

        // Spans the shared edge of tiles 1 and 2.
        let hits = loader.tiles_intersecting(&BoundingBox::new(21.0005, 105.8, 21.0015, 105.801));
        assert_eq!(hits, vec![1, 2]);

        // Touches only the boundary between the tiles: still both.
        let hits = loader.tiles_intersecting(&BoundingBox::new(21.001, 105.8, 21.001, 105.801));
        assert_eq!(hits, vec![1, 2]);

        // Far away.
        let hits = loader.tiles_intersecting(&BoundingBox::new(50.0, 10.0, 51.0, 11.0));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_tile_bounds_lookup() {
        let loader = TileLoader::load(None).unwrap();
        let bounds = loader.tile_bounds(1).unwrap();
        assert_eq!(bounds.min_lat, 21.0);
        assert_eq!(bounds.min_lon, 105.8);
        assert!(loader.tile_bounds(999).is_none());
    }

    // ── Tile loading ─────────────────────────────────────────────────────

    #[test]
    fn test_load_tile_from_data_file() {
        let dir = TempDir::new().unwrap();
        let index_path = write_two_tile_fixture(&dir);
        let loader = TileLoader::load(Some(&index_path)).unwrap();

        let tile = loader.load_tile(1).unwrap();
        assert_eq!(tile.nodes.len(), 1);
        assert_eq!(tile.edges.len(), 1);
        assert_eq!(tile.nodes[0].id, 1 * NODE_ID_STRIDE);
        assert_eq!(tile.nodes[0].node_type, NodeType::Junction);
        assert_eq!(tile.edges[0].from_node, 1000);
        assert_eq!(tile.edges[0].to_node, 2000);
        assert_eq!(tile.edges[0].speed_limit_kmh, 50);

        let tile2 = loader.load_tile(2).unwrap();
        assert_eq!(tile2.nodes.len(), 1);
        assert!(tile2.edges.is_empty());
    }

    #[test]
    fn test_load_tile_unknown_id() {
        let loader = TileLoader::load(None).unwrap();
        assert!(matches!(
            loader.load_tile(999),
            Err(TileError::TileNotFound(999))
        ));
    }

    #[test]
    fn test_load_counter_increments() {
        let loader = TileLoader::load(None).unwrap();
        assert_eq!(loader.load_count(), 0);
        loader.load_tile(1).unwrap();
        loader.load_tile(2).unwrap();
        assert_eq!(loader.load_count(), 2);
    }

    #[test]
    fn test_malformed_blob_is_rejected() {
        let dir = TempDir::new().unwrap();
        let index_path = dir.path().join("tiles.idx");
        let entries = vec![TileIndexEntry {
            tile_id: 1,
            bounds: BoundingBox::new(21.0, 105.8, 21.001, 105.801),
            offset: 0,
            size: 10,
        }];
        std::fs::write(&index_path, encode_index(&entries)).unwrap();
        // Ten bytes: count header claims more payload than exists.
        std::fs::write(index_path.with_extension("dat"), vec![9u8; 10]).unwrap();

        let loader = TileLoader::load(Some(&index_path)).unwrap();
        assert!(matches!(
            loader.load_tile(1),
            Err(TileError::MalformedTile { tile_id: 1, .. })
        ));
    }

    // ── Synthetic generation ─────────────────────────────────────────────

    #[test]
    fn test_synthetic_tile_is_deterministic() {
        let loader = TileLoader::load(None).unwrap();
        let a = loader.load_tile(3).unwrap();
        let b = loader.load_tile(3).unwrap();
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.edges, b.edges);
    }

    #[test]
    fn test_synthetic_nodes_inside_bounds_with_scoped_ids() {
        let loader = TileLoader::load(None).unwrap();
        let tile = loader.load_tile(5).unwrap();

        assert_eq!(tile.nodes.len(), 9);
        for (k, node) in tile.nodes.iter().enumerate() {
            assert_eq!(node.id, 5 * NODE_ID_STRIDE + k as u64);
            assert!(tile.bounds.contains(&node.position));
        }
    }

    #[test]
    fn test_synthetic_edges_are_paired_and_short() {
        let loader = TileLoader::load(None).unwrap();
        let tile = loader.load_tile(1).unwrap();

        assert!(!tile.edges.is_empty());
        assert_eq!(tile.edges.len() % 2, 0, "every edge has its reverse");
        for pair in tile.edges.chunks(2) {
            assert_eq!(pair[0].from_node, pair[1].to_node);
            assert_eq!(pair[0].to_node, pair[1].from_node);
            assert!(pair[0].length_m < SYNTHETIC_EDGE_THRESHOLD_M);
            assert!(pair[0].length_m > 0.0);
        }
    }

    #[test]
    fn test_synthetic_tiles_have_distinct_content() {
        let loader = TileLoader::load(None).unwrap();
        let a = loader.load_tile(1).unwrap();
        let b = loader.load_tile(2).unwrap();
        assert_ne!(a.nodes[0].id, b.nodes[0].id);
        assert_ne!(a.nodes[0].position, b.nodes[0].position);
    }
}
