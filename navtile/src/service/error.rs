//! Map service error types.

use crate::ipc::TransportError;
use crate::tile::TileError;
use thiserror::Error;

/// Errors reported by [`super::MapService`] lifecycle operations.
///
/// Query misses are not errors: bounding-box queries return empty sets
/// and nearest-node queries return the sentinel node.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A lifecycle or query method was called before `initialize`
    #[error("service is not initialized")]
    NotInitialized,

    /// Tile index could not be loaded during initialization
    #[error("tile index error: {0}")]
    Index(#[from] TileError),

    /// IPC channel could not be created
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The IPC server thread could not be spawned
    #[error("failed to spawn IPC thread: {0}")]
    ThreadSpawn(std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_display() {
        assert_eq!(
            ServiceError::NotInitialized.to_string(),
            "service is not initialized"
        );
    }

    #[test]
    fn test_index_error_conversion() {
        let err: ServiceError = TileError::TileNotFound(3).into();
        assert!(err.to_string().contains("tile 3"));
    }
}
