use std::fmt;

/// Lifecycle state of a [`crate::Connection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport is open
    #[default]
    Disconnected,
    /// A connect attempt is in progress
    Connecting,
    /// The transport is open and the receive loop is running
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}
