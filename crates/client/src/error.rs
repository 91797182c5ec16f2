//! Typed client error types

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the typed client
#[derive(Debug, Error)]
pub enum Error {
    /// The connection failed
    #[error(transparent)]
    Connection(#[from] pyon_connection::Error),

    /// The message layer failed
    #[error(transparent)]
    Messages(pyon_messages::Error),

    /// A cached value could not be parsed into the requested type
    #[error("failed to deserialize {type_name}: {source}")]
    Deserialization {
        /// Requested type
        type_name: &'static str,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// The requested type has no key in the type map
    #[error("no protocol key registered for {0}")]
    UnknownType(&'static str),

    /// A value parsed as JSON but does not have the layout the type expects
    #[error("unexpected shape for {type_name}: {detail}")]
    UnexpectedShape {
        /// Requested type
        type_name: &'static str,
        /// What did not match
        detail: String,
    },
}

impl From<pyon_messages::Error> for Error {
    fn from(error: pyon_messages::Error) -> Self {
        match error {
            pyon_messages::Error::Connection(e) => Self::Connection(e),
            other => Self::Messages(other),
        }
    }
}

impl Error {
    pub(crate) fn shape(type_name: &'static str, detail: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            type_name,
            detail: detail.into(),
        }
    }
}
