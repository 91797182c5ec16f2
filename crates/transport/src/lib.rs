//! Generic transport abstraction for the PyON status protocol
//!
//! This crate provides a transport-agnostic interface for reaching a worker's
//! command port. Specific implementations (TCP, in-memory) are provided in
//! separate crates so the connection layer never touches OS sockets directly.
//!
//! A connected transport is handed out as a [`TransportStream`]: a reader half
//! that is drained cooperatively by the receive loop, and a writer half used by
//! callers sending commands.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;

use async_trait::async_trait;
use std::fmt::Debug;

pub use error::TransportError;
pub use error::TransportError as Error;

/// Result alias used by transport implementations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Socket-level options applied when a transport connects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SocketOptions {
    /// Receive buffer size in bytes (OS default when `None`)
    pub receive_buffer_size: Option<u32>,
    /// Send buffer size in bytes (OS default when `None`)
    pub send_buffer_size: Option<u32>,
}

/// Transport trait for opening connections to a worker
///
/// Implementations own the details of address resolution and socket setup.
/// The caller is responsible for bounding the connect with a timeout.
#[async_trait]
pub trait Transport: Debug + Send + Sync + 'static {
    /// Open a connection to `host:port`
    async fn connect(
        &self,
        host: &str,
        port: u16,
        options: &SocketOptions,
    ) -> Result<TransportStream>;
}

/// Read half of a connected transport
///
/// Reads never wait for data: the receive loop polls this on every tick.
pub trait TransportReader: Debug + Send {
    /// Read whatever is immediately available into `buf`
    ///
    /// Returns:
    /// - `Ok(Some(n))` with `n > 0` when bytes were read
    /// - `Ok(Some(0))` when the peer closed the stream
    /// - `Ok(None)` when no data is available right now
    fn try_read(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;
}

/// Write half of a connected transport
#[async_trait]
pub trait TransportWriter: Debug + Send {
    /// Write the entire buffer, returning once it has been handed to the OS
    async fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Shut down the write direction and release the connection
    async fn shutdown(&mut self) -> Result<()>;
}

/// A connected transport, split into independently owned halves
#[derive(Debug)]
pub struct TransportStream {
    /// Read half, owned by the receive loop
    pub reader: Box<dyn TransportReader>,
    /// Write half, shared by command senders
    pub writer: Box<dyn TransportWriter>,
}

impl TransportStream {
    /// Assemble a stream from its two halves
    pub fn new(reader: Box<dyn TransportReader>, writer: Box<dyn TransportWriter>) -> Self {
        Self { reader, writer }
    }
}
