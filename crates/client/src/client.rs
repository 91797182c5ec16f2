use crate::error::{Error, Result};
use crate::message::{Message, MessageCollection, MessageItem, short_type_name};
use crate::type_map::{MessageShape, TypeMap};

use pyon_connection::{ConnectionConfig, ConnectionEvent, ConnectionState};
use pyon_messages::{KeyTypeResolver, MessageConnection};
use pyon_transport::Transport;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Commands that subscribe to the keys in [`TypeMap::standard`]
pub const STANDARD_UPDATES: &[&str] = &[
    "updates clear",
    "updates add 0 5 $heartbeat",
    "updates add 1 60 $info",
    "updates add 2 5 $(options -a)",
    "updates add 3 5 $slot-info",
    "updates add 4 5 $queue-info",
];

/// Typed client for a worker.
///
/// Wraps a [`MessageConnection`] and materializes cached messages into the
/// types registered in its [`TypeMap`].
#[derive(Debug, Clone)]
pub struct Client {
    connection: MessageConnection,
    types: Arc<TypeMap>,
}

impl Client {
    /// Create a disconnected client using [`TypeMap::standard`]
    pub fn new<T: Transport>(transport: T, config: ConnectionConfig) -> Self {
        Self::with_type_map(transport, config, Arc::new(TypeMap::standard()))
    }

    /// Create a disconnected client using `types`
    pub fn with_type_map<T: Transport>(
        transport: T,
        config: ConnectionConfig,
        types: Arc<TypeMap>,
    ) -> Self {
        let resolver: Arc<dyn KeyTypeResolver> = types.clone();
        let connection = MessageConnection::with_resolver(transport, config, Some(resolver));
        Self { connection, types }
    }

    /// The message connection
    #[must_use]
    pub const fn connection(&self) -> &MessageConnection {
        &self.connection
    }

    /// The type map
    #[must_use]
    pub fn type_map(&self) -> &TypeMap {
        &self.types
    }

    /// Connect and optionally authenticate
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

    /// Send one command line
    ///
    /// # Errors
    ///
    /// `NotConnected` when the connection is not established.
    pub async fn send_command(&self, command: &str) -> Result<()> {
        Ok(self.connection.send_command(command).await?)
    }

    /// Subscribe the worker to the standard update streams
    ///
    /// # Errors
    ///
    /// `NotConnected` when the connection is not established.
    pub async fn request_standard_updates(&self) -> Result<()> {
        for command in STANDARD_UPDATES {
            self.send_command(command).await?;
        }
        debug!("Requested {} standard updates", STANDARD_UPDATES.len());
        Ok(())
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

    /// Latest message of type `T`.
    ///
    /// Returns `Ok(None)` when nothing has been received under `T`'s key.
    ///
    /// # Errors
    ///
    /// `UnknownType` when `T` is not in the type map, or the fill error when
    /// the cached value does not fit `T`.
    pub fn get_message<T: Message>(&self) -> Result<Option<T>> {
        self.materialize::<T>(None)
    }

    /// Latest list-shaped message of type `C`.
    ///
    /// # Errors
    ///
    /// As [`Self::get_message`], plus `UnexpectedShape` when `C` is
    /// registered as a scalar.
    pub fn get_message_collection<C, I>(&self) -> Result<Option<C>>
    where
        C: MessageCollection<I>,
        I: MessageItem,
    {
        self.materialize::<C>(Some(MessageShape::Collection))
    }

    fn materialize<T: Message>(&self, shape: Option<MessageShape>) -> Result<Option<T>> {
        let type_name = short_type_name::<T>();
        let entry = self
            .types
            .resolve::<T>()
            .ok_or(Error::UnknownType(type_name))?;

        if let Some(expected) = shape {
            if entry.shape() != expected {
                return Err(Error::shape(
                    type_name,
                    format!("'{}' is registered as {:?}", entry.key(), entry.shape()),
                ));
            }
        }

        let Some(message) = self.connection.get_message(entry.key()) else {
            return Ok(None);
        };

        let mut typed = T::default();
        typed.fill(message.value())?;
        Ok(Some(typed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Heartbeat, Options, Slot, SlotCollection};
    use pyon_transport_memory::MemoryTransport;
    use std::any::TypeId;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct DoubledHeartbeat {
        value: i64,
    }

    impl Message for DoubledHeartbeat {
        fn fill(&mut self, value: &str) -> Result<()> {
            let heartbeat: Heartbeat = crate::message::from_json(value)?;
            self.value = heartbeat.value * 2;
            Ok(())
        }

        fn base_type() -> Option<TypeId> {
            Some(TypeId::of::<Heartbeat>())
        }
    }

    #[derive(Debug, Default)]
    struct Unregistered;

    impl Message for Unregistered {
        fn fill(&mut self, _value: &str) -> Result<()> {
            Ok(())
        }
    }

    async fn connected(data: &str) -> Client {
        let transport = MemoryTransport::new().with_initial_data(data);
        let client = Client::new(
            transport,
            ConnectionConfig::default().with_receive_interval(Duration::from_millis(5)),
        );
        let mut rx = client.subscribe();
        client.connect("localhost", 36330, None).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Ok(ConnectionEvent::UpdateFinished) = rx.recv().await {
                    if !client.connection().cache().is_empty() {
                        break;
                    }
                }
            }
        })
        .await
        .unwrap();
        client
    }

    #[tokio::test]
    async fn test_get_message_by_base_type() {
        let client = connected("PyON 1 heartbeat\n21\n---\n").await;

        let heartbeat = client.get_message::<Heartbeat>().unwrap().unwrap();
        assert_eq!(heartbeat.value, 21);

        let doubled = client.get_message::<DoubledHeartbeat>().unwrap().unwrap();
        assert_eq!(doubled.value, 42);
    }

    #[tokio::test]
    async fn test_missing_message_is_none() {
        let client = connected("PyON 1 heartbeat\n1\n---\n").await;
        assert_eq!(client.get_message::<Options>().unwrap(), None);
    }

    #[tokio::test]
    async fn test_unregistered_type() {
        let client = connected("PyON 1 heartbeat\n1\n---\n").await;
        let result = client.get_message::<Unregistered>();
        assert!(matches!(result, Err(Error::UnknownType("Unregistered"))));
    }

    #[tokio::test]
    async fn test_collection_shape_is_checked() {
        let types = TypeMap::new().with_message::<SlotCollection>("slots");
        let client = Client::with_type_map(
            MemoryTransport::new(),
            ConnectionConfig::default(),
            Arc::new(types),
        );

        let result = client.get_message_collection::<SlotCollection, Slot>();
        assert!(matches!(result, Err(Error::UnexpectedShape { .. })));
    }

    #[tokio::test]
    async fn test_standard_updates_require_connection() {
        let client = Client::new(MemoryTransport::new(), ConnectionConfig::default());
        let result = client.request_standard_updates().await;
        assert!(matches!(
            result,
            Err(Error::Connection(pyon_connection::Error::NotConnected))
        ));
    }
}
