//! Error types for tile index loading and tile decoding.

use thiserror::Error;

/// Errors that can occur while loading the tile index or decoding tiles.
#[derive(Debug, Error)]
pub enum TileError {
    /// I/O error reading the index or data file
    #[error("tile I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index file exists but cannot be parsed
    #[error("tile index is malformed: {0}")]
    MalformedIndex(String),

    /// Tile id absent from the index
    #[error("tile {0} is not present in the index")]
    TileNotFound(u64),

    /// Tile blob exists but cannot be decoded
    #[error("tile {tile_id} data is malformed: {reason}")]
    MalformedTile {
        /// Id of the offending tile
        tile_id: u64,
        /// What went wrong during decoding
        reason: String,
    },
}
