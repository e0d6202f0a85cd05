//! Blocking IPC dispatch loop.
//!
//! Runs on the dedicated server thread owned by
//! [`crate::service::MapService`]. Each iteration blocks on the
//! transport with a bounded timeout, re-checks the shutdown flag, and
//! answers exactly one request. Malformed and unrecognized requests get
//! an explicit `INVALID_PARAMETER` reply; the channel is never torn
//! down in response to a bad request.

use crate::ipc::message::{decode_request, Reply, Request, Status};
use crate::ipc::{MessageTransport, TransportError};
use crate::service::QueryEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Receive loop: runs until the shutdown flag is set or the transport
/// disconnects.
pub fn run_server(
    engine: Arc<QueryEngine>,
    transport: Box<dyn MessageTransport>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
) {
    debug!("IPC server loop started");
    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("IPC server received shutdown signal");
            break;
        }
        match transport.recv_timeout(poll_interval) {
            Ok(Some(frame)) => {
                let reply = handle_frame(&engine, &frame);
                if let Err(e) = transport.send_reply(&reply.encode()) {
                    warn!(error = %e, "failed to send IPC reply");
                }
            }
            Ok(None) => continue,
            Err(TransportError::Disconnected) => {
                debug!("IPC transport disconnected, server loop exiting");
                break;
            }
            Err(e) => {
                warn!(error = %e, "IPC receive failed");
            }
        }
    }
    debug!("IPC server loop stopped");
}

/// Decode one request frame and produce its reply.
pub fn handle_frame(engine: &QueryEngine, frame: &[u8]) -> Reply {
    match decode_request(frame) {
        Ok(request) => handle_request(engine, &request),
        Err(e) => {
            debug!(request_id = e.request_id, description = %e.description, "invalid request");
            Reply::error(e.request_id, Status::InvalidParameter, e.description)
        }
    }
}

/// Dispatch a decoded request to the query engine.
fn handle_request(engine: &QueryEngine, request: &Request) -> Reply {
    match request {
        Request::GraphDataInBbox { request_id, bbox } => {
            let data = engine.map_graph_data(bbox);
            if data.is_empty() {
                Reply::error(
                    *request_id,
                    Status::MapDataNotFound,
                    format!("no map data in {}", bbox),
                )
            } else {
                Reply::success(
                    *request_id,
                    data.nodes.len() as u32,
                    data.edges.len() as u32,
                    data.dropped_edges as u32,
                )
            }
        }
        Request::NodesInBbox { request_id, bbox } => {
            let nodes = engine.nodes_in_bounding_box(bbox);
            Reply::success(*request_id, nodes.len() as u32, 0, 0)
        }
    }
}
