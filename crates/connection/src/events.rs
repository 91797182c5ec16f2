//! Events published by a connection and the layers built on it.

use tokio::sync::broadcast;
use tracing::{error, info, trace, warn};

/// Severity attached to a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Routine lifecycle information
    Info,
    /// Something the caller should notice but that did not fail
    Warning,
    /// A failure
    Error,
}

/// Notifications delivered to every subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Human-readable lifecycle or failure report
    StatusMessage {
        /// Message text
        message: String,
        /// Severity
        level: StatusLevel,
    },
    /// The connected flag changed
    ConnectedChanged(bool),
    /// Bytes written to the transport
    DataSent(usize),
    /// Bytes drained from the transport in one update. Not published for
    /// updates that read nothing.
    DataReceived(usize),
    /// A message was stored in the cache
    MessageUpdated {
        /// Message key
        key: String,
        /// Name of the Rust type mapped to the key, if any
        type_name: Option<&'static str>,
    },
    /// A framing pass finished
    UpdateFinished,
}

/// Broadcast channel for [`ConnectionEvent`]s.
///
/// Slow subscribers lose the oldest events rather than blocking the
/// receive loop.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ConnectionEvent>,
}

impl EventBus {
    /// Create a bus holding up to `capacity` undelivered events per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: ConnectionEvent) {
        if self.sender.send(event).is_err() {
            trace!("No subscribers for connection event");
        }
    }

    /// Log a status message and publish it
    pub fn status(&self, level: StatusLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            StatusLevel::Info => info!("{}", message),
            StatusLevel::Warning => warn!("{}", message),
            StatusLevel::Error => error!("{}", message),
        }
        self.publish(ConnectionEvent::StatusMessage { message, level });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
