//! Road-network graph primitives.
//!
//! Nodes and edges are immutable value types produced by tile decoding.
//! Edges are directed; a bidirectional road is represented as two edges
//! with swapped endpoints, and callers must not assume deduplication.

mod edge;
mod node;

pub use edge::{MapEdge, RoadType};
pub use node::{MapNode, NodeType, NODE_ID_STRIDE, SENTINEL_NODE_ID};
