//! navtile - Tiled road-network storage, caching and spatial queries
//!
//! This library stores road-network graph data in geographic tiles,
//! keeps a bounded in-memory cache of recently used tiles, answers
//! spatial graph queries (bounding-box node/edge retrieval, nearest
//! node) and serves those queries to other processes over a synchronous
//! request/reply IPC channel.
//!
//! # High-Level API
//!
//! For most use cases the [`service`] module provides the facade:
//!
//! ```
//! use navtile::service::{MapService, ServiceConfig};
//! use navtile::ipc::channel_pair;
//! use navtile::geo::BoundingBox;
//!
//! let mut service = MapService::new(ServiceConfig::default());
//! service.initialize().expect("initialize");
//!
//! let (transport, _client) = channel_pair();
//! service.start(Box::new(transport)).expect("start");
//!
//! let bbox = BoundingBox::new(21.0, 105.8, 21.001, 105.801);
//! let nodes = service.nodes_in_bounding_box(&bbox).expect("query");
//! assert!(!nodes.is_empty());
//!
//! service.stop();
//! ```

pub mod cache;
pub mod geo;
pub mod graph;
pub mod ipc;
pub mod logging;
pub mod service;
pub mod tile;

/// Version of the navtile library and CLI.
///
/// Synchronized across all components in the workspace; defined in
/// `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
