use crate::cache::MessageCache;
use crate::error::{Error, Result};
use crate::framer::{Framer, KeyTypeResolver};
use crate::message::RawMessage;

use pyon_connection::{Connection, ConnectionConfig, ConnectionEvent, ConnectionState};
use pyon_transport::Transport;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A [`Connection`] whose receive loop frames incoming text into a
/// [`MessageCache`].
#[derive(Debug, Clone)]
pub struct MessageConnection {
    connection: Connection,
    framer: Arc<Framer>,
}

impl MessageConnection {
    /// Create a disconnected message connection
    pub fn new<T: Transport>(transport: T, config: ConnectionConfig) -> Self {
        Self::with_resolver(transport, config, None)
    }

    /// Create a disconnected message connection that names the type mapped
    /// to each key in `MessageUpdated` events
    pub fn with_resolver<T: Transport>(
        transport: T,
        config: ConnectionConfig,
        resolver: Option<Arc<dyn KeyTypeResolver>>,
    ) -> Self {
        let framer = Arc::new(Framer::new(Arc::new(MessageCache::new()), resolver));
        let connection = Connection::with_handler(transport, config, framer.clone());
        Self { connection, framer }
    }

    /// The underlying connection
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// The message cache
    #[must_use]
    pub fn cache(&self) -> &MessageCache {
        self.framer.cache()
    }

    /// Connect; see [`Connection::connect`]
    ///
    /// # Errors
    ///
    /// Returns the connection error for a rejected or failed attempt.
    pub async fn connect(&self, host: &str, port: u16, password: Option<&str>) -> Result<()> {
        Ok(self.connection.connect(host, port, password).await?)
    }

    /// Close the connection
    pub async fn close(&self) {
        self.connection.close().await;
    }

    /// Send one command line; see [`Connection::send_command`]
    ///
    /// # Errors
    ///
    /// `NotConnected` when the connection is not established.
    pub async fn send_command(&self, command: &str) -> Result<()> {
        Ok(self.connection.send_command(command).await?)
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Whether the connection is established
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Subscribe to connection and message events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.connection.subscribe()
    }

    /// Latest raw message for `key`
    #[must_use]
    pub fn get_message(&self, key: &str) -> Option<Arc<RawMessage>> {
        self.cache().get(key)
    }

    /// Latest message for `key`, parsed as JSON
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] when the cached value does not parse.
    pub fn get_json_message(&self, key: &str) -> Result<Option<serde_json::Value>> {
        self.get_message(key)
            .map(|message| {
                message.to_json().map_err(|source| Error::Json {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Received text not yet part of a complete frame
    #[must_use]
    pub fn pending_text(&self) -> String {
        self.framer.pending_text()
    }
}
