//! TCP transport implementation for the PyON status protocol
//!
//! This crate provides a tokio TCP implementation of the pyon-transport traits.
//! The stream is split into owned halves so the receive loop can poll the read
//! side while callers write commands on the other.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use async_trait::async_trait;
use pyon_transport::{
    Result, SocketOptions, Transport, TransportError, TransportReader, TransportStream,
    TransportWriter,
};
use std::io::ErrorKind;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpSocket, lookup_host};
use tracing::{debug, trace};

/// TCP transport implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

impl TcpTransport {
    /// Create a new TCP transport
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve `host:port`, taking the first address returned
    async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
        lookup_host((host, port))
            .await?
            .next()
            .ok_or_else(|| TransportError::InvalidAddress(format!("{host}:{port}")))
    }

    /// Create an unconnected socket for `addr` with the requested buffer sizes
    fn socket_for(addr: &SocketAddr, options: &SocketOptions) -> Result<TcpSocket> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };

        if let Some(size) = options.receive_buffer_size {
            socket.set_recv_buffer_size(size)?;
        }
        if let Some(size) = options.send_buffer_size {
            socket.set_send_buffer_size(size)?;
        }

        Ok(socket)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        options: &SocketOptions,
    ) -> Result<TransportStream> {
        let addr = Self::resolve(host, port).await?;
        debug!("Connecting to {} ({}:{})", addr, host, port);

        let socket = Self::socket_for(&addr, options)?;
        let stream = socket
            .connect(addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("{addr}: {e}")))?;
        stream.set_nodelay(true)?;

        debug!("TCP connection established to {}", addr);

        let (read_half, write_half) = stream.into_split();
        Ok(TransportStream::new(
            Box::new(TcpReader { inner: read_half }),
            Box::new(TcpWriter {
                inner: Some(write_half),
            }),
        ))
    }
}

/// Read half of a TCP connection
#[derive(Debug)]
pub struct TcpReader {
    inner: OwnedReadHalf,
}

impl TransportReader for TcpReader {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        match self.inner.try_read(buf) {
            Ok(n) => {
                trace!("Read {} bytes", n);
                Ok(Some(n))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}

/// Write half of a TCP connection
#[derive(Debug)]
pub struct TcpWriter {
    inner: Option<OwnedWriteHalf>,
}

#[async_trait]
impl TransportWriter for TcpWriter {
    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let writer = self.inner.as_mut().ok_or(TransportError::Closed)?;
        writer.write_all(buf).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        if let Some(mut writer) = self.inner.take() {
            writer.shutdown().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_localhost() {
        let addr = TcpTransport::resolve("127.0.0.1", 36330).await.unwrap();
        assert_eq!(addr.port(), 36330);
        assert!(addr.is_ipv4());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop a listener to get a port nothing is listening on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpTransport::new()
            .connect("127.0.0.1", port, &SocketOptions::default())
            .await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_write_after_shutdown() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut stream = TcpTransport::new()
            .connect("127.0.0.1", port, &SocketOptions::default())
            .await
            .unwrap();

        stream.writer.shutdown().await.unwrap();
        // Second shutdown is a no-op
        stream.writer.shutdown().await.unwrap();

        let result = stream.writer.write_all(b"help\n").await;
        assert!(matches!(result, Err(TransportError::Closed)));
    }
}
