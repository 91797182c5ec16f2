//! Transport error types

use thiserror::Error;

/// Errors raised by transport implementations
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote end refused or could not complete the connection
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The host/port pair could not be resolved to a socket address
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The stream has already been shut down
    #[error("transport closed")]
    Closed,

    /// Underlying I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Whether this error is the interrupted-read error raised when a stream
    /// is torn down underneath a pending read.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_interrupted_detection() {
        let err = TransportError::from(io::Error::from(io::ErrorKind::Interrupted));
        assert!(err.is_interrupted());

        let err = TransportError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(!err.is_interrupted());

        assert!(!TransportError::Closed.is_interrupted());
    }
}
