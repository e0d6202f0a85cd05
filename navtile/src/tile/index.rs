//! On-disk tile index records.
//!
//! The persisted index is a `u32` record count followed by fixed-size
//! little-endian records. Each record names a tile, its bounds and where
//! its blob lives in the sibling data file. Index entries are loader
//! internals and are never exposed outside the `tile` module.

use crate::geo::BoundingBox;
use crate::tile::TileError;
use bytes::Buf;

/// Size in bytes of one serialized index record.
pub(crate) const RECORD_SIZE: usize = 8 + 4 * 8 + 8 + 4;

/// One row of the persisted tile index.
#[derive(Debug, Clone)]
pub(crate) struct TileIndexEntry {
    /// Index-wide unique tile id.
    pub tile_id: u64,
    /// Geographic extent; never changes after index load.
    pub bounds: BoundingBox,
    /// Byte offset of the tile blob in the data file.
    pub offset: u64,
    /// Byte length of the tile blob.
    pub size: u32,
}

/// Decode a persisted index from raw bytes.
///
/// # Errors
///
/// `TileError::MalformedIndex` when the byte stream is truncated or the
/// declared record count does not match the payload.
pub(crate) fn decode_index(mut buf: &[u8]) -> Result<Vec<TileIndexEntry>, TileError> {
    if buf.remaining() < 4 {
        return Err(TileError::MalformedIndex(
            "missing record count header".to_string(),
        ));
    }
    let count = buf.get_u32_le() as usize;
    if buf.remaining() != count * RECORD_SIZE {
        return Err(TileError::MalformedIndex(format!(
            "expected {} records ({} bytes), found {} bytes",
            count,
            count * RECORD_SIZE,
            buf.remaining()
        )));
    }

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let tile_id = buf.get_u64_le();
        let min_lat = buf.get_f64_le();
        let min_lon = buf.get_f64_le();
        let max_lat = buf.get_f64_le();
        let max_lon = buf.get_f64_le();
        let offset = buf.get_u64_le();
        let size = buf.get_u32_le();

        if min_lat > max_lat || min_lon > max_lon {
            return Err(TileError::MalformedIndex(format!(
                "tile {} has inverted bounds",
                tile_id
            )));
        }

        entries.push(TileIndexEntry {
            tile_id,
            bounds: BoundingBox::new(min_lat, min_lon, max_lat, max_lon),
            offset,
            size,
        });
    }
    Ok(entries)
}

#[cfg(test)]
pub(crate) fn encode_index(entries: &[TileIndexEntry]) -> Vec<u8> {
    use bytes::BufMut;

    let mut out = Vec::with_capacity(4 + entries.len() * RECORD_SIZE);
    out.put_u32_le(entries.len() as u32);
    for e in entries {
        out.put_u64_le(e.tile_id);
        out.put_f64_le(e.bounds.min_lat);
        out.put_f64_le(e.bounds.min_lon);
        out.put_f64_le(e.bounds.max_lat);
        out.put_f64_le(e.bounds.max_lon);
        out.put_u64_le(e.offset);
        out.put_u32_le(e.size);
    }
    out
}
