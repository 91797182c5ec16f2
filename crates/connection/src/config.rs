//! Connection configuration

use pyon_transport::SocketOptions;
use std::time::Duration;

/// Configuration for a [`crate::Connection`]
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// How long `connect` waits for the transport
    pub connect_timeout: Duration,
    /// Delay between receive-loop ticks
    pub receive_interval: Duration,
    /// Size of the chunk buffer the transport is drained into
    pub read_chunk_size: usize,
    /// Socket buffer sizes handed to the transport
    pub socket: SocketOptions,
    /// Events retained per subscriber before the oldest are dropped
    pub event_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),      // 5 seconds
            receive_interval: Duration::from_millis(10), // 10 milliseconds
            read_chunk_size: 8 * 1024,                   // 8KB
            socket: SocketOptions::default(),
            event_capacity: 1024,
        }
    }
}

impl ConnectionConfig {
    /// Set the connect timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the receive-loop interval
    #[must_use]
    pub const fn with_receive_interval(mut self, interval: Duration) -> Self {
        self.receive_interval = interval;
        self
    }

    /// Set the read chunk size
    #[must_use]
    pub const fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Set the socket options
    #[must_use]
    pub const fn with_socket_options(mut self, socket: SocketOptions) -> Self {
        self.socket = socket;
        self
    }

    /// Set the per-subscriber event capacity
    #[must_use]
    pub const fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.receive_interval, Duration::from_millis(10));
        assert_eq!(config.read_chunk_size, 8192);
        assert_eq!(config.socket, SocketOptions::default());
    }

    #[test]
    fn test_config_builder() {
        let config = ConnectionConfig::default()
            .with_connect_timeout(Duration::from_millis(250))
            .with_receive_interval(Duration::from_millis(50))
            .with_read_chunk_size(16)
            .with_event_capacity(8);

        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.receive_interval, Duration::from_millis(50));
        assert_eq!(config.read_chunk_size, 16);
        assert_eq!(config.event_capacity, 8);
    }
}
