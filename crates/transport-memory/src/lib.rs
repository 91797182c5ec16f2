//! In-memory transport implementation for testing
//!
//! This transport never touches the network. Each connect creates an in-process
//! pipe whose far end is driven through a [`MemoryRemote`] handle: tests push
//! the bytes the worker would send, inspect the commands the client wrote, and
//! inject failures (refused connects, slow connects, broken writes, read
//! errors, peer close).
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use async_trait::async_trait;
use parking_lot::Mutex;
use pyon_transport::{
    Result, SocketOptions, Transport, TransportError, TransportReader, TransportStream,
    TransportWriter,
};
use std::collections::VecDeque;
use std::fmt::Debug;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One end-to-end in-memory connection
#[derive(Debug, Default)]
struct Pipe {
    /// Bytes travelling remote → client
    inbound: VecDeque<u8>,
    /// Bytes travelling client → remote
    outbound: Vec<u8>,
    /// Remote end has closed; reads report EOF once `inbound` is drained
    eof: bool,
    /// Client has shut down its writer
    client_closed: bool,
    /// Writes fail with a broken pipe
    fail_writes: bool,
    /// Next read fails with this error kind
    read_error: Option<io::ErrorKind>,
}

/// Shared transport state
#[derive(Debug, Default)]
struct State {
    /// Bytes delivered to every new connection before anything else
    initial_data: Vec<u8>,
    /// Artificial connect latency
    connect_delay: Option<Duration>,
    /// Refuse connects with this reason
    refuse: Option<String>,
    /// Most recent connection
    current: Option<Arc<Mutex<Pipe>>>,
    /// Number of successful connects
    connects: usize,
    /// Last address/options seen by `connect`
    last_target: Option<(String, u16, SocketOptions)>,
}

/// Memory transport implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
}

impl MemoryTransport {
    /// Create a new memory transport whose connects succeed immediately
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `data` to the client as soon as each connection opens
    #[must_use]
    pub fn with_initial_data(self, data: impl AsRef<[u8]>) -> Self {
        self.state.lock().initial_data = data.as_ref().to_vec();
        self
    }

    /// Delay every connect by `delay`
    #[must_use]
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        self.state.lock().connect_delay = Some(delay);
        self
    }

    /// Refuse every connect
    #[must_use]
    pub fn refusing(self, reason: impl Into<String>) -> Self {
        self.state.lock().refuse = Some(reason.into());
        self
    }

    /// Handle to the remote end of the current (and future) connections
    #[must_use]
    pub fn remote(&self) -> MemoryRemote {
        MemoryRemote {
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        options: &SocketOptions,
    ) -> Result<TransportStream> {
        let (delay, refuse) = {
            let mut state = self.state.lock();
            state.last_target = Some((host.to_string(), port, *options));
            (state.connect_delay, state.refuse.clone())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(reason) = refuse {
            debug!("Refusing memory connection to {}:{}", host, port);
            return Err(TransportError::ConnectionFailed(reason));
        }

        let pipe = {
            let mut state = self.state.lock();
            let pipe = Arc::new(Mutex::new(Pipe {
                inbound: state.initial_data.iter().copied().collect(),
                ..Pipe::default()
            }));
            state.current = Some(Arc::clone(&pipe));
            state.connects += 1;
            pipe
        };

        debug!("Memory connection established to {}:{}", host, port);

        Ok(TransportStream::new(
            Box::new(MemoryReader {
                pipe: Arc::clone(&pipe),
            }),
            Box::new(MemoryWriter { pipe }),
        ))
    }
}

/// Remote end of the memory transport, used by tests to play the worker
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    state: Arc<Mutex<State>>,
}

impl MemoryRemote {
    fn with_pipe<R>(&self, f: impl FnOnce(&mut Pipe) -> R) -> Option<R> {
        let pipe = self.state.lock().current.clone()?;
        let mut guard = pipe.lock();
        Some(f(&mut guard))
    }

    /// Send bytes to the client. Returns `false` when nothing is connected.
    pub fn push(&self, data: impl AsRef<[u8]>) -> bool {
        self.with_pipe(|pipe| pipe.inbound.extend(data.as_ref().iter().copied()))
            .is_some()
    }

    /// Close the remote end; the client sees EOF after draining pending bytes
    pub fn close(&self) {
        self.with_pipe(|pipe| pipe.eof = true);
    }

    /// Make subsequent client writes fail
    pub fn fail_writes(&self) {
        self.with_pipe(|pipe| pipe.fail_writes = true);
    }

    /// Make the next client read fail with `kind`
    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        self.with_pipe(|pipe| pipe.read_error = Some(kind));
    }

    /// Everything the client has written so far
    #[must_use]
    pub fn written(&self) -> Vec<u8> {
        self.with_pipe(|pipe| pipe.outbound.clone())
            .unwrap_or_default()
    }

    /// Everything the client has written so far, split into lines
    #[must_use]
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written())
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Whether the client shut down its side of the current connection
    #[must_use]
    pub fn client_closed(&self) -> bool {
        self.with_pipe(|pipe| pipe.client_closed).unwrap_or(false)
    }

    /// Number of successful connects so far
    #[must_use]
    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    /// Host, port and options passed to the most recent connect
    #[must_use]
    pub fn last_target(&self) -> Option<(String, u16, SocketOptions)> {
        self.state.lock().last_target.clone()
    }
}

/// Client read half of a memory connection
#[derive(Debug)]
struct MemoryReader {
    pipe: Arc<Mutex<Pipe>>,
}

impl TransportReader for MemoryReader {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let mut pipe = self.pipe.lock();

        if let Some(kind) = pipe.read_error.take() {
            return Err(TransportError::Io(io::Error::from(kind)));
        }

        if pipe.inbound.is_empty() {
            return Ok(if pipe.eof { Some(0) } else { None });
        }

        let n = buf.len().min(pipe.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(pipe.inbound.drain(..n)) {
            *slot = byte;
        }

        Ok(Some(n))
    }
}

/// Client write half of a memory connection
#[derive(Debug)]
struct MemoryWriter {
    pipe: Arc<Mutex<Pipe>>,
}

#[async_trait]
impl TransportWriter for MemoryWriter {
    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let mut pipe = self.pipe.lock();

        if pipe.client_closed {
            return Err(TransportError::Closed);
        }
        if pipe.fail_writes {
            return Err(TransportError::Io(io::Error::from(io::ErrorKind::BrokenPipe)));
        }

        pipe.outbound.extend_from_slice(buf);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.pipe.lock().client_closed = true;
        Ok(())
    }
}
