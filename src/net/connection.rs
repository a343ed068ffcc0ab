//! Connection state and lifecycle tracking.
//!
//! # Responsibilities
//! - Own one peer session: split read and write halves, peer address, state
//! - Generate unique connection IDs for tracing
//! - Track live connections so shutdown can drain them

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::config::DEFAULT_MAX_LINE_BYTES;
use crate::net::error::NetError;
use crate::net::framing::{write_line, LineReader};
use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Connection state for lifecycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connection is open for reads and writes.
    Active,
    /// Connection is closed.
    Closed,
}

/// One TCP peer session.
///
/// The stream is split at construction: reads go through a buffered read
/// half, writes through the owned write half, so neither direction needs
/// exclusive access to the other.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: LineReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    state: ConnectionState,
}

impl Connection {
    /// Wrap an accepted stream with the default line limit.
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self::with_line_limit(stream, peer, DEFAULT_MAX_LINE_BYTES)
    }

    /// Wrap an accepted stream; lines longer than `max_line_bytes` fail the
    /// read.
    pub fn with_line_limit(stream: TcpStream, peer: SocketAddr, max_line_bytes: usize) -> Self {
        // Lines are small and interactive
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(peer_addr = %peer, error = %e, "Could not disable Nagle");
        }
        let (read_half, write_half) = stream.into_split();
        Self {
            id: ConnectionId::new(),
            peer,
            reader: LineReader::with_limit(read_half, max_line_bytes),
            writer: write_half,
            state: ConnectionState::Active,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Read one line. `Ok(None)` means the peer closed its write side.
    pub async fn read_line(&mut self) -> Result<Option<String>, NetError> {
        let line = self.reader.read_line().await?;
        match line {
            Some(_) => metrics::record_line_received(),
            None => self.state = ConnectionState::Closed,
        }
        Ok(line)
    }

    /// Write one line.
    pub async fn write_line(&mut self, line: &str) -> Result<(), NetError> {
        write_line(&mut self.writer, line).await
    }

    /// Shut down both directions of the socket.
    ///
    /// A peer that already went away is not an error.
    pub async fn shutdown(self) -> Result<(), NetError> {
        let stream = self
            .reader
            .into_inner()
            .reunite(self.writer)
            .map_err(std::io::Error::other)?;
        let stream = stream.into_std()?;
        match stream.shutdown(std::net::Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    /// Current count of active connections.
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self, id: ConnectionId) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        metrics::record_connection_opened();
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id,
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until all connections are closed or `limit` elapses.
    ///
    /// Returns the number of connections still open.
    pub async fn drain(&self, limit: Duration) -> u64 {
        let deadline = tokio::time::Instant::now() + limit;
        while self.active_count() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.active_count()
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        metrics::record_connection_closed();
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (server, peer) = listener.accept().await.unwrap();
        (Connection::new(server, peer), client)
    }

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track(ConnectionId::new());
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track(ConnectionId::new());
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.id(), guard2.id());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_gives_up_after_limit() {
        let tracker = ConnectionTracker::new();
        let _guard = tracker.track(ConnectionId::new());
        assert_eq!(tracker.drain(Duration::from_secs(1)).await, 1);
    }

    #[tokio::test]
    async fn reads_lines_until_peer_closes() {
        let (mut conn, mut client) = pair().await;
        assert_eq!(conn.state(), ConnectionState::Active);

        client.write_all(b"ping\npong\n").await.unwrap();
        client.shutdown().await.unwrap();

        assert_eq!(conn.read_line().await.unwrap().as_deref(), Some("ping"));
        assert_eq!(conn.read_line().await.unwrap().as_deref(), Some("pong"));
        assert_eq!(conn.read_line().await.unwrap(), None);
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn shutdown_closes_both_directions() {
        let (mut conn, mut client) = pair().await;
        conn.write_line("bye").await.unwrap();
        conn.shutdown().await.unwrap();

        let mut received = String::new();
        client.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "bye\n");
    }
}
