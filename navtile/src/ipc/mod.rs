//! Synchronous request/reply IPC.
//!
//! The query core is transport-agnostic: [`MessageTransport`] abstracts
//! the channel, with an in-process implementation for tests and embedding
//! and a Unix-socket implementation for separate processes. The wire
//! protocol itself lives in [`message`]; the blocking dispatch loop in
//! [`server`].

pub mod message;
pub mod server;
mod transport;

pub use transport::{
    channel_pair, ChannelClient, ChannelTransport, MessageTransport, TransportError,
};
#[cfg(unix)]
pub use transport::{UdsClient, UdsTransport};
