//! Message layer error types

use thiserror::Error;

/// Result type for message operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the message layer
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying connection failed
    #[error(transparent)]
    Connection(#[from] pyon_connection::Error),

    /// A cached value is not valid JSON
    #[error("message '{key}' is not valid JSON: {source}")]
    Json {
        /// Message key
        key: String,
        /// Parser error
        source: serde_json::Error,
    },
}
