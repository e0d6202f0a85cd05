//! Message transport abstraction.
//!
//! The server loop talks to clients through [`MessageTransport`] so the
//! query/cache core never names a concrete channel. Two implementations
//! ship here: an in-process pair of mpsc channels for tests and
//! embedding, and a Unix datagram socket for separate processes.
//!
//! The server protocol is strictly one reply per request, so a transport
//! only has to remember the requester of the most recent receive.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::net::{SocketAddr, UnixDatagram};
#[cfg(unix)]
use std::path::Path;
#[cfg(unix)]
use std::sync::Mutex;

/// Largest frame a datagram transport will accept.
#[cfg(unix)]
const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying socket error
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer side of the channel is gone
    #[error("transport disconnected")]
    Disconnected,

    /// A reply was requested before any request was received
    #[error("no request to reply to")]
    NoPendingRequest,

    /// A client-side wait expired
    #[error("timed out waiting for reply")]
    Timeout,
}

/// A synchronous request/reply channel as seen by the server.
pub trait MessageTransport: Send {
    /// Wait up to `timeout` for the next request frame.
    ///
    /// Returns `Ok(None)` when the timeout expires with no message; the
    /// server loop uses this granularity to poll its shutdown flag.
    fn recv_timeout(&self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError>;

    /// Send a reply to the requester of the most recent receive.
    fn send_reply(&self, frame: &[u8]) -> Result<(), TransportError>;
}

/// Server end of an in-process transport.
pub struct ChannelTransport {
    requests: Receiver<Vec<u8>>,
    replies: Sender<Vec<u8>>,
}

/// Client end of an in-process transport.
pub struct ChannelClient {
    requests: Sender<Vec<u8>>,
    replies: Receiver<Vec<u8>>,
}

/// Create a connected in-process transport pair.
pub fn channel_pair() -> (ChannelTransport, ChannelClient) {
    let (request_tx, request_rx) = channel();
    let (reply_tx, reply_rx) = channel();
    (
        ChannelTransport {
            requests: request_rx,
            replies: reply_tx,
        },
        ChannelClient {
            requests: request_tx,
            replies: reply_rx,
        },
    )
}

impl MessageTransport for ChannelTransport {
    fn recv_timeout(&self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        match self.requests.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Disconnected),
        }
    }

    fn send_reply(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.replies
            .send(frame.to_vec())
            .map_err(|_| TransportError::Disconnected)
    }
}

impl ChannelClient {
    /// Send a request frame and block for the matching reply.
    pub fn request(&self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>, TransportError> {
        self.requests
            .send(frame.to_vec())
            .map_err(|_| TransportError::Disconnected)?;
        match self.replies.recv_timeout(timeout) {
            Ok(reply) => Ok(reply),
            Err(RecvTimeoutError::Timeout) => Err(TransportError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

/// Unix datagram transport for cross-process clients.
///
/// The socket file is created at bind time; a stale file from a previous
/// run is removed first. Replies go to the bound address of the peer
/// whose request was received last.
#[cfg(unix)]
pub struct UdsTransport {
    socket: UnixDatagram,
    last_peer: Mutex<Option<SocketAddr>>,
}

#[cfg(unix)]
impl UdsTransport {
    /// Bind the server socket at `path`.
    pub fn bind(path: &Path) -> Result<Self, TransportError> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        let socket = UnixDatagram::bind(path)?;
        Ok(Self {
            socket,
            last_peer: Mutex::new(None),
        })
    }
}

#[cfg(unix)]
impl MessageTransport for UdsTransport {
    fn recv_timeout(&self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        self.socket.set_read_timeout(Some(timeout))?;
        let mut buf = vec![0u8; MAX_FRAME_SIZE];
        match self.socket.recv_from(&mut buf) {
            Ok((len, peer)) => {
                buf.truncate(len);
                *self.last_peer.lock().unwrap() = Some(peer);
                Ok(Some(buf))
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn send_reply(&self, frame: &[u8]) -> Result<(), TransportError> {
        let peer = self.last_peer.lock().unwrap().clone();
        let peer = peer.ok_or(TransportError::NoPendingRequest)?;
        let path = peer.as_pathname().ok_or(TransportError::NoPendingRequest)?;
        self.socket.send_to(frame, path)?;
        Ok(())
    }
}

/// Client side of the Unix datagram transport.
///
/// Binds its own socket so the server has an address to reply to.
#[cfg(unix)]
pub struct UdsClient {
    socket: UnixDatagram,
}

#[cfg(unix)]
impl UdsClient {
    /// Bind a client socket at `client_path` and aim it at the server.
    pub fn connect(client_path: &Path, server_path: &Path) -> Result<Self, TransportError> {
        if client_path.exists() {
            std::fs::remove_file(client_path)?;
        }
        let socket = UnixDatagram::bind(client_path)?;
        socket.connect(server_path)?;
        Ok(Self { socket })
    }

    /// Send a request frame and block for the reply.
    pub fn request(&self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>, TransportError> {
        self.socket.send(frame)?;
        self.socket.set_read_timeout(Some(timeout))?;
        let mut buf = vec![0u8; MAX_FRAME_SIZE];
        match self.socket.recv(&mut buf) {
            Ok(len) => {
                buf.truncate(len);
                Ok(buf)
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Err(TransportError::Timeout)
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_channel_pair_request_reply() {
        let (server, client) = channel_pair();

        let echo = thread::spawn(move || {
            let frame = server
                .recv_timeout(Duration::from_secs(1))
                .unwrap()
                .unwrap();
            server.send_reply(&frame).unwrap();
        });

        let reply = client
            .request(b"hello", Duration::from_secs(1))
            .unwrap();
        assert_eq!(reply, b"hello");
        echo.join().unwrap();
    }

    #[test]
    fn test_channel_recv_timeout_returns_none() {
        let (server, _client) = channel_pair();
        let got = server.recv_timeout(Duration::from_millis(10)).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn test_channel_recv_after_client_drop_is_disconnected() {
        let (server, client) = channel_pair();
        drop(client);
        let err = server.recv_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
    }

    #[cfg(unix)]
    #[test]
    fn test_uds_request_reply() {
        let dir = tempfile::TempDir::new().unwrap();
        let server_path = dir.path().join("server.sock");
        let client_path = dir.path().join("client.sock");

        let server = UdsTransport::bind(&server_path).unwrap();
        let client = UdsClient::connect(&client_path, &server_path).unwrap();

        let echo = thread::spawn(move || {
            let frame = server
                .recv_timeout(Duration::from_secs(1))
                .unwrap()
                .unwrap();
            server.send_reply(&frame).unwrap();
        });

        let reply = client
            .request(b"ping", Duration::from_secs(1))
            .unwrap();
        assert_eq!(reply, b"ping");
        echo.join().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_uds_reply_without_request_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let server = UdsTransport::bind(&dir.path().join("server.sock")).unwrap();
        let err = server.send_reply(b"orphan").unwrap_err();
        assert!(matches!(err, TransportError::NoPendingRequest));
    }

    #[cfg(unix)]
    #[test]
    fn test_uds_bind_replaces_stale_socket_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("server.sock");
        std::fs::write(&path, b"stale").unwrap();
        let transport = UdsTransport::bind(&path).unwrap();
        drop(transport);
        // Bound successfully despite the stale file.
    }
}
