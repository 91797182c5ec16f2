use crate::buffer::ReceiveBuffer;
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::events::{ConnectionEvent, EventBus, StatusLevel};
use crate::state::ConnectionState;

use parking_lot::{Mutex, RwLock};
use pyon_transport::{
    Transport, TransportError, TransportReader, TransportStream, TransportWriter,
};
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Hook run by the receive loop.
///
/// Layers that interpret the received text (the message framer) implement
/// this and are handed to [`Connection::with_handler`].
pub trait UpdateHandler: Send + Sync + 'static {
    /// Called after every tick in which the transport was drained without error
    fn after_update(&self, connection: &Connection);

    /// Called once per session, after the transport opens and before the
    /// receive loop starts
    fn on_connected(&self, _connection: &Connection) {}
}

/// Read half plus its scratch chunk
struct ReadState {
    reader: Box<dyn TransportReader>,
    chunk: Vec<u8>,
}

impl ReadState {
    fn new(reader: Box<dyn TransportReader>, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk: vec![0; chunk_size.max(1)],
        }
    }
}

struct Inner {
    config: ConnectionConfig,
    transport: Arc<dyn Transport>,
    handler: Option<Arc<dyn UpdateHandler>>,
    state: RwLock<ConnectionState>,
    /// Cancelled when the current session (or connect attempt) ends
    session: Mutex<Option<CancellationToken>>,
    reader: Mutex<Option<ReadState>>,
    writer: tokio::sync::Mutex<Option<Box<dyn TransportWriter>>>,
    buffer: ReceiveBuffer,
    events: EventBus,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(token) = self.session.get_mut().take() {
            token.cancel();
        }
    }
}

/// A live text connection to a worker.
///
/// Cloning is cheap and every clone drives the same underlying session.
/// While connected, a background task drains the transport every
/// `receive_interval` into the receive buffer and then runs the
/// [`UpdateHandler`], if any.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Create a disconnected connection over `transport`
    pub fn new<T: Transport>(transport: T, config: ConnectionConfig) -> Self {
        Self::build(Arc::new(transport), config, None)
    }

    /// Create a disconnected connection whose receive loop runs `handler`
    pub fn with_handler<T: Transport>(
        transport: T,
        config: ConnectionConfig,
        handler: Arc<dyn UpdateHandler>,
    ) -> Self {
        Self::build(Arc::new(transport), config, Some(handler))
    }

    fn build(
        transport: Arc<dyn Transport>,
        config: ConnectionConfig,
        handler: Option<Arc<dyn UpdateHandler>>,
    ) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                handler,
                state: RwLock::new(ConnectionState::Disconnected),
                session: Mutex::new(None),
                reader: Mutex::new(None),
                writer: tokio::sync::Mutex::new(None),
                buffer: ReceiveBuffer::new(),
                events,
            }),
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    /// Whether the connection is established
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Configuration this connection was built with
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// The event bus shared with layers built on this connection
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Subscribe to connection events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.inner.events.subscribe()
    }

    /// Open the transport, authenticate if a password is given, and start
    /// the receive loop.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty host, `AlreadyConnected` unless the
    /// connection is disconnected, `Timeout` when the transport does not
    /// open in time, `Cancelled` when [`Self::close`] runs first, and the
    /// transport's own error when it refuses.
    pub async fn connect(&self, host: &str, port: u16, password: Option<&str>) -> Result<()> {
        if host.trim().is_empty() {
            return Err(self.reject(Error::InvalidArgument("host must not be empty")));
        }

        let token = {
            let mut state = self.inner.state.write();
            if *state == ConnectionState::Disconnected {
                *state = ConnectionState::Connecting;
                let token = CancellationToken::new();
                *self.inner.session.lock() = Some(token.clone());
                Some(token)
            } else {
                None
            }
        };
        let Some(token) = token else {
            return Err(self.reject(Error::AlreadyConnected));
        };

        info!("Connecting to {}:{}", host, port);

        let connect_timeout = self.inner.config.connect_timeout;
        let attempt = tokio::time::timeout(
            connect_timeout,
            self.inner
                .transport
                .connect(host, port, &self.inner.config.socket),
        );

        let result = tokio::select! {
            () = token.cancelled() => return Err(Error::Cancelled),
            result = attempt => result,
        };

        let stream = match result {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(self.abort_connect(&token, e.into(), host, port)),
            Err(_) => {
                let error = Error::Timeout(connect_timeout);
                return Err(self.abort_connect(&token, error, host, port));
            }
        };

        let TransportStream { reader, mut writer } = stream;

        if let Some(password) = password.filter(|p| !p.is_empty()) {
            let command = format!("auth {password}\n");
            if let Err(e) = writer.write_all(command.as_bytes()).await {
                let _ = writer.shutdown().await;
                return Err(self.abort_connect(&token, Error::Write(e), host, port));
            }
            debug!("Sent authentication");
            self.inner
                .events
                .publish(ConnectionEvent::DataSent(command.len()));
        }

        *self.inner.writer.lock().await = Some(writer);

        let established = {
            let mut state = self.inner.state.write();
            if *state == ConnectionState::Connecting && !token.is_cancelled() {
                *self.inner.reader.lock() =
                    Some(ReadState::new(reader, self.inner.config.read_chunk_size));
                *state = ConnectionState::Connected;
                true
            } else {
                false
            }
        };

        if !established {
            let writer = self.inner.writer.lock().await.take();
            if let Some(mut writer) = writer {
                let _ = writer.shutdown().await;
            }
            return Err(Error::Cancelled);
        }

        self.inner.buffer.clear();
        if let Some(handler) = &self.inner.handler {
            handler.on_connected(self);
        }

        self.inner
            .events
            .publish(ConnectionEvent::ConnectedChanged(true));
        self.inner
            .events
            .status(StatusLevel::Info, format!("Connected to {host}:{port}"));

        self.spawn_receive_loop(token);
        Ok(())
    }

    /// Report a rejected call as an error status
    fn reject(&self, error: Error) -> Error {
        self.inner
            .events
            .status(StatusLevel::Error, format!("Request rejected: {error}"));
        error
    }

    /// Roll back a failed connect attempt unless `close` already did
    fn abort_connect(
        &self,
        token: &CancellationToken,
        error: Error,
        host: &str,
        port: u16,
    ) -> Error {
        {
            let mut state = self.inner.state.write();
            if token.is_cancelled() {
                return Error::Cancelled;
            }
            *state = ConnectionState::Disconnected;
            self.inner.session.lock().take();
        }
        token.cancel();

        self.inner.events.status(
            StatusLevel::Error,
            format!("Failed to connect to {host}:{port}: {error}"),
        );
        error
    }

    /// Close the connection. Idempotent; also cancels an in-flight connect.
    pub async fn close(&self) {
        let previous = {
            let mut state = self.inner.state.write();
            let previous = std::mem::replace(&mut *state, ConnectionState::Disconnected);
            if let Some(token) = self.inner.session.lock().take() {
                token.cancel();
            }
            previous
        };

        self.inner.reader.lock().take();

        let writer = self.inner.writer.lock().await.take();
        if let Some(mut writer) = writer {
            if let Err(e) = writer.shutdown().await {
                debug!("Error shutting down writer: {}", e);
            }
        }

        match previous {
            ConnectionState::Connected => {
                self.inner
                    .events
                    .publish(ConnectionEvent::ConnectedChanged(false));
                self.inner.events.status(StatusLevel::Info, "Connection closed");
            }
            ConnectionState::Connecting => {
                self.inner
                    .events
                    .status(StatusLevel::Info, "Connection attempt cancelled");
            }
            ConnectionState::Disconnected => trace!("Close on a closed connection"),
        }
    }

    /// Send one command line.
    ///
    /// A trailing newline is appended when missing. Blank commands are
    /// reported as a warning and not sent. A failed write is reported as an
    /// error status and closes the connection; it is not returned.
    ///
    /// # Errors
    ///
    /// `NotConnected` when the connection is not established.
    pub async fn send_command(&self, command: &str) -> Result<()> {
        if !self.is_connected() {
            return Err(self.reject(Error::NotConnected));
        }

        if command.trim().is_empty() {
            self.inner
                .events
                .status(StatusLevel::Warning, "No command text given");
            return Ok(());
        }

        let line: Cow<'_, str> = if command.ends_with('\n') {
            Cow::Borrowed(command)
        } else {
            Cow::Owned(format!("{command}\n"))
        };

        let result = {
            let mut writer = self.inner.writer.lock().await;
            match writer.as_mut() {
                Some(writer) => writer.write_all(line.as_bytes()).await,
                None => Err(TransportError::Closed),
            }
        };

        match result {
            Ok(()) => {
                debug!("Sent {} bytes", line.len());
                self.inner
                    .events
                    .publish(ConnectionEvent::DataSent(line.len()));
            }
            Err(e) => {
                let error = Error::Write(e);
                self.inner
                    .events
                    .status(StatusLevel::Error, format!("Failed to send command: {error}"));
                self.close().await;
            }
        }

        Ok(())
    }

    /// Text received since the buffer was last cleared
    #[must_use]
    pub fn get_buffer(&self, clear: bool) -> String {
        self.inner.buffer.text(clear)
    }

    /// The received chunks, in arrival order
    #[must_use]
    pub fn get_buffer_chunks(&self, clear: bool) -> Vec<String> {
        self.inner.buffer.chunks(clear)
    }

    /// Drain everything the transport has available into the buffer.
    ///
    /// Returns the number of bytes read; a closed connection reads nothing.
    /// An EOF that follows data in the same drain is left for the next call
    /// so the data reaches the handler first.
    fn update(&self) -> Result<usize> {
        let mut total = 0;
        {
            let mut guard = self.inner.reader.lock();
            let Some(read) = guard.as_mut() else {
                return Ok(0);
            };

            loop {
                match read.reader.try_read(&mut read.chunk).map_err(Error::Read)? {
                    None => break,
                    Some(0) if total > 0 => break,
                    Some(0) => return Err(Error::StreamClosed),
                    Some(n) => {
                        self.inner.buffer.append(&read.chunk[..n]);
                        total += n;
                    }
                }
            }
        }

        if total > 0 {
            trace!("Received {} bytes", total);
            self.inner
                .events
                .publish(ConnectionEvent::DataReceived(total));
        }

        Ok(total)
    }

    async fn tick(&self) {
        match self.update() {
            Ok(_) => {
                if let Some(handler) = &self.inner.handler {
                    handler.after_update(self);
                }
            }
            Err(e) => {
                if e.is_benign() {
                    debug!("Read interrupted: {}", e);
                } else {
                    self.inner
                        .events
                        .status(StatusLevel::Error, format!("Connection lost: {e}"));
                }
                self.close().await;
            }
        }
    }

    fn spawn_receive_loop(&self, token: CancellationToken) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let interval = self.inner.config.receive_interval;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }

                if token.is_cancelled() {
                    break;
                }
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let connection = Connection { inner };
                connection.tick().await;

                if token.is_cancelled() || !connection.is_connected() {
                    break;
                }
            }
            trace!("Receive loop stopped");
        });
    }
}
