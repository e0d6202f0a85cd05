//! Wire protocol for the map service.
//!
//! Frames are little-endian. A request is a typed header plus a body:
//! `u32 msg_type, u64 request_id, body`. Bounding-box bodies are four
//! `f64` values (min_lat, min_lon, max_lat, max_lon). A reply is
//! `u64 request_id, i32 status, u32 node_count, u32 edge_count,
//! u32 dropped_edges, u16 desc_len, desc`. Bulk node/edge payloads are
//! transferred out of band; the synchronous reply carries counts only.

use crate::geo::BoundingBox;
use bytes::{Buf, BufMut};
use std::fmt;

/// Request type: nodes and edges intersecting a bounding box.
pub const MSG_GRAPH_DATA_IN_BBOX: u32 = 1;
/// Request type: nodes intersecting a bounding box.
pub const MSG_NODES_IN_BBOX: u32 = 2;

/// Request header size: type + request id.
const HEADER_SIZE: usize = 4 + 8;
/// Bounding-box body size: four f64 values.
const BBOX_BODY_SIZE: usize = 4 * 8;

/// Status code carried on every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Request handled.
    Success,
    /// Malformed or unrecognized request.
    InvalidParameter,
    /// The queried region holds no map data.
    MapDataNotFound,
    /// Unexpected server-side failure.
    InternalError,
}

impl Status {
    /// Wire representation.
    pub fn as_i32(&self) -> i32 {
        match self {
            Status::Success => 0,
            Status::InvalidParameter => 1,
            Status::MapDataNotFound => 2,
            Status::InternalError => 3,
        }
    }

    /// Decode from the wire, mapping unknown codes to `InternalError`.
    pub fn from_i32(raw: i32) -> Self {
        match raw {
            0 => Status::Success,
            1 => Status::InvalidParameter,
            2 => Status::MapDataNotFound,
            _ => Status::InternalError,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Success => "SUCCESS",
            Status::InvalidParameter => "INVALID_PARAMETER",
            Status::MapDataNotFound => "MAP_DATA_NOT_FOUND",
            Status::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(name)
    }
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Nodes and edges in a bounding box.
    GraphDataInBbox {
        /// Correlation id echoed in the reply.
        request_id: u64,
        /// Query region.
        bbox: BoundingBox,
    },
    /// Nodes in a bounding box.
    NodesInBbox {
        /// Correlation id echoed in the reply.
        request_id: u64,
        /// Query region.
        bbox: BoundingBox,
    },
}

impl Request {
    /// Correlation id of the request.
    pub fn request_id(&self) -> u64 {
        match self {
            Request::GraphDataInBbox { request_id, .. } => *request_id,
            Request::NodesInBbox { request_id, .. } => *request_id,
        }
    }

    /// Serialize for the wire.
    pub fn encode(&self) -> Vec<u8> {
        let (msg_type, request_id, bbox) = match self {
            Request::GraphDataInBbox { request_id, bbox } => {
                (MSG_GRAPH_DATA_IN_BBOX, *request_id, bbox)
            }
            Request::NodesInBbox { request_id, bbox } => (MSG_NODES_IN_BBOX, *request_id, bbox),
        };
        encode_raw_request(msg_type, request_id, bbox)
    }
}

/// Build a raw request frame. Also usable for unrecognized types, which
/// clients should never send but tests do.
pub fn encode_raw_request(msg_type: u32, request_id: u64, bbox: &BoundingBox) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + BBOX_BODY_SIZE);
    out.put_u32_le(msg_type);
    out.put_u64_le(request_id);
    out.put_f64_le(bbox.min_lat);
    out.put_f64_le(bbox.min_lon);
    out.put_f64_le(bbox.max_lat);
    out.put_f64_le(bbox.max_lon);
    out
}

/// Why a request frame could not be decoded.
///
/// Carries whatever request id could be salvaged so the error reply can
/// still be correlated by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDecodeError {
    /// Salvaged correlation id (0 when the header itself was truncated).
    pub request_id: u64,
    /// Human-readable description for the error reply.
    pub description: String,
}

/// Decode a request frame.
///
/// # Errors
///
/// `RequestDecodeError` for truncated frames, bodies of the wrong size
/// and unrecognized message types.
pub fn decode_request(mut buf: &[u8]) -> Result<Request, RequestDecodeError> {
    if buf.remaining() < HEADER_SIZE {
        return Err(RequestDecodeError {
            request_id: 0,
            description: format!("truncated header: {} bytes", buf.remaining()),
        });
    }
    let msg_type = buf.get_u32_le();
    let request_id = buf.get_u64_le();

    match msg_type {
        MSG_GRAPH_DATA_IN_BBOX | MSG_NODES_IN_BBOX => {
            if buf.remaining() != BBOX_BODY_SIZE {
                return Err(RequestDecodeError {
                    request_id,
                    description: format!(
                        "bounding-box body must be {} bytes, found {}",
                        BBOX_BODY_SIZE,
                        buf.remaining()
                    ),
                });
            }
            let bbox = BoundingBox::new(
                buf.get_f64_le(),
                buf.get_f64_le(),
                buf.get_f64_le(),
                buf.get_f64_le(),
            );
            if bbox.min_lat > bbox.max_lat || bbox.min_lon > bbox.max_lon {
                return Err(RequestDecodeError {
                    request_id,
                    description: format!("inverted bounding box {}", bbox),
                });
            }
            Ok(match msg_type {
                MSG_GRAPH_DATA_IN_BBOX => Request::GraphDataInBbox { request_id, bbox },
                _ => Request::NodesInBbox { request_id, bbox },
            })
        }
        other => Err(RequestDecodeError {
            request_id,
            description: format!("unrecognized request type {}", other),
        }),
    }
}

/// A reply frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Correlation id copied from the request.
    pub request_id: u64,
    /// Outcome of the request.
    pub status: Status,
    /// Number of nodes in the result set.
    pub node_count: u32,
    /// Number of edges in the result set.
    pub edge_count: u32,
    /// Edges excluded because no endpoint could be resolved.
    pub dropped_edges: u32,
    /// Human-readable detail, non-empty on errors.
    pub description: String,
}

impl Reply {
    /// A success reply carrying result counts.
    pub fn success(request_id: u64, node_count: u32, edge_count: u32, dropped_edges: u32) -> Self {
        Self {
            request_id,
            status: Status::Success,
            node_count,
            edge_count,
            dropped_edges,
            description: String::new(),
        }
    }

    /// An error reply with a description and zero counts.
    pub fn error(request_id: u64, status: Status, description: impl Into<String>) -> Self {
        Self {
            request_id,
            status,
            node_count: 0,
            edge_count: 0,
            dropped_edges: 0,
            description: description.into(),
        }
    }

    /// Serialize for the wire. The description is truncated to fit its
    /// 16-bit length field.
    pub fn encode(&self) -> Vec<u8> {
        let desc = self.description.as_bytes();
        let desc_len = desc.len().min(u16::MAX as usize);

        let mut out = Vec::with_capacity(8 + 4 + 4 + 4 + 4 + 2 + desc_len);
        out.put_u64_le(self.request_id);
        out.put_i32_le(self.status.as_i32());
        out.put_u32_le(self.node_count);
        out.put_u32_le(self.edge_count);
        out.put_u32_le(self.dropped_edges);
        out.put_u16_le(desc_len as u16);
        out.put_slice(&desc[..desc_len]);
        out
    }

    /// Decode a reply frame. Used by clients; the server only encodes.
    pub fn decode(mut buf: &[u8]) -> Option<Self> {
        if buf.remaining() < 8 + 4 + 4 + 4 + 4 + 2 {
            return None;
        }
        let request_id = buf.get_u64_le();
        let status = Status::from_i32(buf.get_i32_le());
        let node_count = buf.get_u32_le();
        let edge_count = buf.get_u32_le();
        let dropped_edges = buf.get_u32_le();
        let desc_len = buf.get_u16_le() as usize;
        if buf.remaining() != desc_len {
            return None;
        }
        let description = String::from_utf8_lossy(&buf[..desc_len]).into_owned();
        Some(Self {
            request_id,
            status,
            node_count,
            edge_count,
            dropped_edges,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(21.0, 105.8, 21.001, 105.801)
    }

    #[test]
    fn test_request_roundtrip() {
        let req = Request::GraphDataInBbox {
            request_id: 42,
            bbox: bbox(),
        };
        let decoded = decode_request(&req.encode()).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_nodes_request_roundtrip() {
        let req = Request::NodesInBbox {
            request_id: 7,
            bbox: bbox(),
        };
        let decoded = decode_request(&req.encode()).unwrap();
        assert_eq!(decoded, req);
        assert_eq!(decoded.request_id(), 7);
    }

    #[test]
    fn test_unknown_type_is_rejected_with_request_id() {
        let frame = encode_raw_request(99, 42, &bbox());
        let err = decode_request(&frame).unwrap_err();
        assert_eq!(err.request_id, 42);
        assert!(err.description.contains("unrecognized request type 99"));
    }

    #[test]
    fn test_truncated_header_is_rejected() {
        let err = decode_request(&[1, 2, 3]).unwrap_err();
        assert_eq!(err.request_id, 0);
        assert!(err.description.contains("truncated header"));
    }

    #[test]
    fn test_short_body_is_rejected() {
        let mut frame = encode_raw_request(MSG_NODES_IN_BBOX, 5, &bbox());
        frame.truncate(frame.len() - 8);
        let err = decode_request(&frame).unwrap_err();
        assert_eq!(err.request_id, 5);
        assert!(err.description.contains("must be 32 bytes"));
    }

    #[test]
    fn test_inverted_bbox_is_rejected() {
        let bad = BoundingBox::new(22.0, 105.8, 21.0, 105.801);
        let frame = encode_raw_request(MSG_NODES_IN_BBOX, 5, &bad);
        let err = decode_request(&frame).unwrap_err();
        assert!(err.description.contains("inverted bounding box"));
    }

    #[test]
    fn test_reply_roundtrip() {
        let reply = Reply::success(42, 9, 40, 2);
        let decoded = Reply::decode(&reply.encode()).unwrap();
        assert_eq!(decoded, reply);
    }

    #[test]
    fn test_error_reply_roundtrip() {
        let reply = Reply::error(0, Status::InvalidParameter, "unrecognized request type 99");
        let decoded = Reply::decode(&reply.encode()).unwrap();
        assert_eq!(decoded.status, Status::InvalidParameter);
        assert_eq!(decoded.description, "unrecognized request type 99");
        assert_eq!(decoded.node_count, 0);
    }

    #[test]
    fn test_reply_decode_rejects_truncated() {
        let mut bytes = Reply::success(1, 2, 3, 0).encode();
        bytes.truncate(5);
        assert!(Reply::decode(&bytes).is_none());
    }

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(Status::Success.as_i32(), 0);
        assert_eq!(Status::InvalidParameter.as_i32(), 1);
        assert_eq!(Status::MapDataNotFound.as_i32(), 2);
        assert_eq!(Status::InternalError.as_i32(), 3);
        for s in [
            Status::Success,
            Status::InvalidParameter,
            Status::MapDataNotFound,
            Status::InternalError,
        ] {
            assert_eq!(Status::from_i32(s.as_i32()), s);
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::MapDataNotFound.to_string(), "MAP_DATA_NOT_FOUND");
    }
}
