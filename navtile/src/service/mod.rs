//! Map service: query orchestration and lifecycle.
//!
//! [`QueryEngine`] answers spatial queries over the cached tile set and
//! maintains the derived node/edge lookup indices; [`MapService`] wraps
//! it in a `Stopped → Initializing → Running` lifecycle and runs the IPC
//! server thread.

mod config;
mod engine;
mod error;
mod map_service;

pub use config::ServiceConfig;
pub use engine::{GraphData, QueryEngine};
pub use error::ServiceError;
pub use map_service::{MapService, ServiceState};
