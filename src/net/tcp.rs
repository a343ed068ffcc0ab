//! Line-oriented TCP server.
//!
//! # Responsibilities
//! - Run the accept loop until shutdown
//! - Spawn one task per connection
//! - Read lines, hand them to a [`LineHandler`], write back any reply
//!
//! # Design Decisions
//! - A connection's failure ends that connection's task only
//! - Accept errors are logged and the loop keeps going
//! - EOF from the peer is a normal end, not an error

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{TcpConfig, DEFAULT_MAX_LINE_BYTES};
use crate::lifecycle::ShutdownListener;
use crate::net::connection::{Connection, ConnectionTracker};
use crate::net::error::NetError;
use crate::net::listener::Listener;
use crate::runtime;

/// Pause after a failed accept so a persistent error (e.g. out of file
/// descriptors) does not spin.
const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// Reacts to each received line.
pub trait LineHandler: Send + Sync + 'static {
    /// Returns the line to send back, if any.
    fn handle(&self, peer: SocketAddr, line: &str) -> Option<String>;
}

/// Logs every line and never replies. Pairs with a write-only client.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLines;

impl LineHandler for LogLines {
    fn handle(&self, peer: SocketAddr, line: &str) -> Option<String> {
        tracing::info!(peer_addr = %peer, line = %line, "Line received");
        None
    }
}

/// Logs every line and sends it back unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoLines;

impl LineHandler for EchoLines {
    fn handle(&self, peer: SocketAddr, line: &str) -> Option<String> {
        tracing::info!(peer_addr = %peer, line = %line, "Line received, echoing");
        Some(line.to_string())
    }
}

/// Pick the handler the configuration asks for.
pub fn handler_for(config: &TcpConfig) -> Arc<dyn LineHandler> {
    if config.echo {
        Arc::new(EchoLines)
    } else {
        Arc::new(LogLines)
    }
}

/// Why a connection loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEnd {
    /// The peer closed its write side.
    PeerClosed,
    /// The server is shutting down.
    ServerShutdown,
}

/// Drive one connection until EOF, error or shutdown.
///
/// On a read or write error the socket is shut down in both directions
/// (best effort) and the error is returned.
pub async fn serve_connection(
    mut conn: Connection,
    handler: &dyn LineHandler,
    mut shutdown: ShutdownListener,
) -> Result<ConnectionEnd, NetError> {
    let peer = conn.peer_addr();
    let result = loop {
        let line = tokio::select! {
            read = conn.read_line() => read,
            _ = shutdown.recv() => break Ok(ConnectionEnd::ServerShutdown),
        };

        match line {
            Ok(Some(line)) => {
                if let Some(reply) = handler.handle(peer, &line) {
                    if let Err(e) = conn.write_line(&reply).await {
                        break Err(e);
                    }
                }
            }
            Ok(None) => {
                tracing::debug!(connection_id = %conn.id(), peer_addr = %peer, "Peer closed connection");
                return Ok(ConnectionEnd::PeerClosed);
            }
            Err(e) => break Err(e),
        }
    };

    let id = conn.id();
    if let Err(e) = &result {
        tracing::warn!(connection_id = %id, peer_addr = %peer, error = %e, "Connection failed");
    }
    if let Err(e) = conn.shutdown().await {
        tracing::debug!(connection_id = %id, peer_addr = %peer, error = %e, "Shutdown after close failed");
    }
    result
}

/// Accept loop for the line protocol.
pub struct TcpServer {
    listener: Listener,
    handler: Arc<dyn LineHandler>,
    tracker: ConnectionTracker,
    max_line_bytes: usize,
}

impl TcpServer {
    pub fn new(listener: Listener, handler: Arc<dyn LineHandler>) -> Self {
        Self {
            listener,
            handler,
            tracker: ConnectionTracker::new(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Cap on one received line; a longer line ends that connection.
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        self.listener.local_addr()
    }

    /// Handle to the live connection count, usable after `run` takes `self`.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept connections until shutdown is triggered.
    pub async fn run(self, mut shutdown: ShutdownListener) {
        tracing::info!(
            max_connections = self.listener.max_connections(),
            "TCP server accepting connections"
        );

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = shutdown.recv() => break,
            };

            let (stream, peer, permit) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_ERROR_PAUSE).await;
                    continue;
                }
            };

            let conn = Connection::with_line_limit(stream, peer, self.max_line_bytes);
            let guard = self.tracker.track(conn.id());
            let handler = Arc::clone(&self.handler);
            let conn_shutdown = shutdown.clone();
            let name = format!("tcp-{}", conn.id());

            runtime::spawn(&name, async move {
                let _permit = permit;
                let _guard = guard;
                match serve_connection(conn, handler.as_ref(), conn_shutdown).await {
                    Ok(end) => tracing::debug!(peer_addr = %peer, end = ?end, "Connection finished"),
                    Err(e) if e.is_disconnect() => {
                        tracing::debug!(peer_addr = %peer, error = %e, "Peer dropped connection")
                    }
                    Err(e) => tracing::warn!(peer_addr = %peer, error = %e, "Connection ended with error"),
                }
            });
        }

        tracing::info!(
            active_connections = self.tracker.active_count(),
            "TCP server stopped accepting"
        );
    }
}
