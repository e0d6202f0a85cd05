//! Graph vertex type.

use crate::geo::Point;

/// Node id returned by nearest-node queries when nothing is found within
/// the search radius. Never assigned to a real node: tile ids start at 1,
/// so the smallest real node id is `NODE_ID_STRIDE`.
pub const SENTINEL_NODE_ID: u64 = 0;

/// Multiplier used to derive globally unique node ids from tile-local
/// indices: `node_id = tile_id * NODE_ID_STRIDE + local_index`.
pub const NODE_ID_STRIDE: u64 = 1000;

/// Role of a node within the road network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeType {
    /// Plain shape point along a road.
    #[default]
    Waypoint,
    /// Intersection of two or more roads.
    Junction,
    /// End of a road with no continuation.
    DeadEnd,
}

impl NodeType {
    /// Decode from the on-disk representation, defaulting unknown values
    /// to `Waypoint`.
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            1 => NodeType::Junction,
            2 => NodeType::DeadEnd,
            _ => NodeType::Waypoint,
        }
    }

    /// On-disk representation.
    pub fn as_u8(&self) -> u8 {
        match self {
            NodeType::Waypoint => 0,
            NodeType::Junction => 1,
            NodeType::DeadEnd => 2,
        }
    }
}

/// A vertex of the road-network graph.
///
/// Created only by tile decoding and immutable once returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapNode {
    /// Dataset-wide unique id (`tile_id * NODE_ID_STRIDE + local_index`).
    pub id: u64,
    /// Geographic position.
    pub position: Point,
    /// Role within the network.
    pub node_type: NodeType,
}

impl MapNode {
    /// Create a new node.
    pub fn new(id: u64, position: Point, node_type: NodeType) -> Self {
        Self {
            id,
            position,
            node_type,
        }
    }

    /// The "not found" sentinel positioned at the given point.
    pub fn sentinel(position: Point) -> Self {
        Self {
            id: SENTINEL_NODE_ID,
            position,
            node_type: NodeType::Waypoint,
        }
    }

    /// Whether this is the sentinel rather than a real node.
    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_NODE_ID
    }
}
