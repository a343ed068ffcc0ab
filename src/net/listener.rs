//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Enforce max_connections limit via semaphore
//! - Surface accept errors to the caller without closing the listener

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::config::TcpConfig;
use crate::net::error::NetError;

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// `accept` waits until a slot becomes available.
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Semaphore to limit concurrent connections.
    connection_limit: Arc<Semaphore>,
    /// Configured maximum connections.
    max_connections: usize,
}

impl Listener {
    /// Bind to the configured address with connection limits.
    pub async fn bind(config: &TcpConfig) -> Result<Self, NetError> {
        let listener = TcpListener::bind(config.bind_address.as_str())
            .await
            .map_err(|e| NetError::bind(&config.bind_address, e))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| NetError::bind(&config.bind_address, e))?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "TCP listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// Suspends until a slot is free and a peer connects. The returned
    /// permit must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), NetError> {
        // Acquire permit first (backpressure)
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| io::Error::other("connection limit closed"))?;

        let (stream, addr) = self.inner.accept().await?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.inner.local_addr()?)
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    /// Get configured maximum connections.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the slot is released back to the listener, even if the
/// connection task panicked.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config(max_connections: usize) -> TcpConfig {
        TcpConfig {
            bind_address: "127.0.0.1:0".into(),
            max_connections,
            ..TcpConfig::default()
        }
    }

    #[tokio::test]
    async fn bind_rejects_malformed_address() {
        let config = TcpConfig {
            bind_address: "no-port-here".into(),
            ..TcpConfig::default()
        };
        let err = Listener::bind(&config).await.err().unwrap();
        assert!(matches!(err, NetError::Bind { .. }));
    }

    #[tokio::test]
    async fn bind_fails_when_address_in_use() {
        let first = Listener::bind(&local_config(1)).await.unwrap();
        let taken = TcpConfig {
            bind_address: first.local_addr().unwrap().to_string(),
            ..TcpConfig::default()
        };
        let err = Listener::bind(&taken).await.err().unwrap();
        assert!(matches!(err, NetError::Bind { .. }));
    }

    #[tokio::test]
    async fn permit_holds_a_slot_until_dropped() {
        let listener = Listener::bind(&local_config(2)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _client = TcpStream::connect(addr).await.unwrap();
        let (_stream, _peer, permit) = listener.accept().await.unwrap();
        assert_eq!(listener.available_permits(), 1);

        drop(permit);
        assert_eq!(listener.available_permits(), 2);
        assert_eq!(listener.max_connections(), 2);
    }
}
