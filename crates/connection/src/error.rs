//! Connection error types

use pyon_transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Result type for connection operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by [`crate::Connection`]
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied argument was rejected
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// `connect` was called while connected or connecting
    #[error("connection is already established")]
    AlreadyConnected,

    /// An operation needing a live connection was called while disconnected
    #[error("connection is not established")]
    NotConnected,

    /// The transport did not connect within the configured timeout
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),

    /// `close` was called while the connection attempt was in progress
    #[error("connection attempt was cancelled")]
    Cancelled,

    /// The worker closed its end of the stream
    #[error("stream closed by peer")]
    StreamClosed,

    /// Writing to the transport failed
    #[error("write failed: {0}")]
    Write(#[source] TransportError),

    /// Reading from the transport failed
    #[error("read failed: {0}")]
    Read(#[source] TransportError),

    /// The transport failed to connect
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// Whether this error is the expected fallout of closing the connection
    /// underneath an in-flight read, which is not worth reporting.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Read(e) if e.is_interrupted())
    }
}
