//! Datagram transport.
//!
//! # Responsibilities
//! - Bind a UDP socket (server side, or an ephemeral client port)
//! - Receive datagrams into a bounded buffer, flagging truncation
//! - Send datagrams to arbitrary peers
//!
//! # Design Decisions
//! - No accept step: every `receive` may come from a different peer
//! - The socket sits behind an `Arc`; send and receive take `&self`, so a
//!   reading task and a writing task share it without a lock
//! - Oversized datagrams are cut to the buffer size. This is a known
//!   limitation of the fixed buffer, reported through `Datagram::truncated`

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::net::UdpSocket;

use crate::config::{ClientConfig, UdpConfig};
use crate::lifecycle::ShutdownListener;
use crate::net::error::NetError;
use crate::observability::metrics;

/// One received datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Sender of the datagram.
    pub peer: SocketAddr,
    /// Payload, at most the endpoint's buffer size.
    pub payload: Vec<u8>,
    /// The datagram was larger than the buffer and lost its tail.
    pub truncated: bool,
}

/// A bound UDP socket with a fixed receive buffer.
#[derive(Debug, Clone)]
pub struct UdpEndpoint {
    socket: Arc<UdpSocket>,
    buffer_size: usize,
}

impl UdpEndpoint {
    /// Bind to `addr`. Use port 0 for an OS-assigned port.
    pub async fn bind(addr: &str, buffer_size: usize) -> Result<Self, NetError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| NetError::bind(addr, e))?;
        Ok(Self {
            socket: Arc::new(socket),
            buffer_size,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Shared handle to the socket.
    pub fn socket(&self) -> Arc<UdpSocket> {
        Arc::clone(&self.socket)
    }

    /// Wait for the next datagram from any peer.
    pub async fn receive(&self) -> Result<Datagram, NetError> {
        // One spare byte tells a datagram that exactly fills the buffer
        // apart from one that overflowed it.
        let mut buf = vec![0u8; self.buffer_size + 1];
        let (n, peer) = self.socket.recv_from(&mut buf).await?;
        let truncated = n > self.buffer_size;
        buf.truncate(n.min(self.buffer_size));

        metrics::record_datagram(truncated);
        if truncated {
            tracing::warn!(
                peer_addr = %peer,
                buffer_size = self.buffer_size,
                "Datagram truncated to buffer size"
            );
        }

        Ok(Datagram {
            peer,
            payload: buf,
            truncated,
        })
    }

    /// Send one datagram.
    pub async fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<usize, NetError> {
        Ok(self.socket.send_to(payload, target).await?)
    }
}

/// Receive loop for the datagram server.
pub struct UdpServer {
    endpoint: UdpEndpoint,
    echo: bool,
}

impl UdpServer {
    pub async fn bind(config: &UdpConfig) -> Result<Self, NetError> {
        let endpoint = UdpEndpoint::bind(&config.bind_address, config.buffer_size).await?;
        tracing::info!(
            address = %endpoint.local_addr()?,
            buffer_size = config.buffer_size,
            "UDP endpoint bound"
        );
        Ok(Self {
            endpoint,
            echo: config.echo,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        self.endpoint.local_addr()
    }

    /// Receive datagrams until shutdown is triggered.
    ///
    /// Receive and send errors are logged; the loop keeps going.
    pub async fn run(self, mut shutdown: ShutdownListener) {
        loop {
            let received = tokio::select! {
                received = self.endpoint.receive() => received,
                _ = shutdown.recv() => break,
            };

            let datagram = match received {
                Ok(datagram) => datagram,
                Err(e) => {
                    tracing::warn!(error = %e, "UDP receive failed");
                    continue;
                }
            };

            tracing::info!(
                peer_addr = %datagram.peer,
                len = datagram.payload.len(),
                truncated = datagram.truncated,
                text = %String::from_utf8_lossy(&datagram.payload),
                "Datagram received"
            );

            if self.echo {
                if let Err(e) = self.endpoint.send_to(&datagram.payload, datagram.peer).await {
                    tracing::warn!(peer_addr = %datagram.peer, error = %e, "UDP echo failed");
                }
            }
        }
        tracing::info!("UDP server stopped");
    }
}

/// Client side: an endpoint plus a fixed target.
#[derive(Debug, Clone)]
pub struct UdpClient {
    endpoint: UdpEndpoint,
    target: SocketAddr,
}

impl UdpClient {
    /// Bind `local` (normally `0.0.0.0:0`) and aim at `target`.
    pub async fn bind(local: &str, target: SocketAddr, buffer_size: usize) -> Result<Self, NetError> {
        let endpoint = UdpEndpoint::bind(local, buffer_size).await?;
        Ok(Self { endpoint, target })
    }

    /// Bind `client.udp_local_address` with the configured receive buffer.
    pub async fn from_config(client: &ClientConfig, udp: &UdpConfig, target: SocketAddr) -> Result<Self, NetError> {
        Self::bind(&client.udp_local_address, target, udp.buffer_size).await
    }

    pub fn endpoint(&self) -> &UdpEndpoint {
        &self.endpoint
    }

    pub async fn send(&self, payload: &[u8]) -> Result<usize, NetError> {
        self.endpoint.send_to(payload, self.target).await
    }

    /// Send each input line as one datagram until EOF or the sentinel line.
    ///
    /// Returns the number of datagrams sent.
    pub async fn send_lines<R>(&self, input: R, sentinel: &str) -> Result<u64, NetError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut sent = 0;
        while let Some(line) = lines.next_line().await? {
            if line.trim() == sentinel {
                break;
            }
            self.send(line.as_bytes()).await?;
            sent += 1;
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MTU;

    #[tokio::test]
    async fn exact_fit_is_not_truncated() {
        let server = UdpEndpoint::bind("127.0.0.1:0", 8).await.unwrap();
        let client = UdpEndpoint::bind("127.0.0.1:0", 8).await.unwrap();

        client.send_to(b"12345678", server.local_addr().unwrap()).await.unwrap();
        let datagram = server.receive().await.unwrap();
        assert_eq!(datagram.payload, b"12345678");
        assert!(!datagram.truncated);
        assert_eq!(datagram.peer, client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn default_buffer_is_mtu() {
        let server = UdpServer::bind(&UdpConfig {
            bind_address: "127.0.0.1:0".into(),
            ..UdpConfig::default()
        })
        .await
        .unwrap();
        assert_eq!(server.endpoint.buffer_size(), MTU);
    }

    #[tokio::test]
    async fn send_lines_stops_at_sentinel() {
        let server = UdpEndpoint::bind("127.0.0.1:0", MTU).await.unwrap();
        let client = UdpClient::bind("127.0.0.1:0", server.local_addr().unwrap(), MTU)
            .await
            .unwrap();

        let sent = client
            .send_lines(&b"one\ntwo\nexit\nthree\n"[..], "exit")
            .await
            .unwrap();
        assert_eq!(sent, 2);
        assert_eq!(server.receive().await.unwrap().payload, b"one");
        assert_eq!(server.receive().await.unwrap().payload, b"two");
    }
}
