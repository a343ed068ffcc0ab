//! Line-oriented TCP client.
//!
//! The stream is split on connect: [`LineSender`] owns the write half and
//! drives the input loop, while the read half can be handed to a separate
//! task that prints whatever the server sends back.

use std::net::SocketAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::config::ClientConfig;
use crate::net::error::NetError;
use crate::net::framing::{write_line, LineReader};
use crate::resilience::Backoff;

/// Connect to `addr`, retrying with exponential backoff.
pub async fn connect(addr: &str, config: &ClientConfig) -> Result<TcpStream, NetError> {
    let mut backoff = Backoff::new(config.base_delay_ms, config.max_delay_ms);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                tracing::debug!(address = %addr, attempt, "Connected");
                return Ok(stream);
            }
            Err(e) if attempt < config.connect_attempts => {
                let delay = backoff.next_delay();
                tracing::info!(address = %addr, attempt, delay = ?delay, error = %e, "Connect failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(NetError::Connect {
                    addr: addr.to_string(),
                    source: e,
                })
            }
        }
    }
}

/// Result of offering one input line to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The line went out.
    Sent,
    /// The sentinel was seen; the write side is shut down.
    Closed,
}

/// Write side of a client connection.
#[derive(Debug)]
pub struct LineSender {
    writer: OwnedWriteHalf,
    sentinel: String,
    closed: bool,
}

impl LineSender {
    pub fn new(writer: OwnedWriteHalf, sentinel: impl Into<String>) -> Self {
        Self {
            writer,
            sentinel: sentinel.into(),
            closed: false,
        }
    }

    /// Send `line`, or close the write side if it is the sentinel.
    ///
    /// After close every further call is a no-op returning `Closed`, so no
    /// bytes follow the sentinel.
    pub async fn send(&mut self, line: &str) -> Result<SendOutcome, NetError> {
        if self.closed {
            return Ok(SendOutcome::Closed);
        }
        if line.trim() == self.sentinel {
            self.close().await?;
            return Ok(SendOutcome::Closed);
        }
        write_line(&mut self.writer, line).await?;
        Ok(SendOutcome::Sent)
    }

    /// Shut down the write side. The peer reads EOF.
    pub async fn close(&mut self) -> Result<(), NetError> {
        if !self.closed {
            self.closed = true;
            self.writer.shutdown().await?;
        }
        Ok(())
    }

    /// Forward every input line until EOF or the sentinel.
    ///
    /// The write side is closed either way. Returns the number of lines sent.
    pub async fn run<R>(&mut self, input: R) -> Result<u64, NetError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut sent = 0;
        while let Some(line) = lines.next_line().await? {
            match self.send(&line).await? {
                SendOutcome::Sent => sent += 1,
                SendOutcome::Closed => return Ok(sent),
            }
        }
        self.close().await?;
        Ok(sent)
    }
}

/// A connected client, split into its two directions.
#[derive(Debug)]
pub struct TcpClient {
    peer: SocketAddr,
    reader: OwnedReadHalf,
    sender: LineSender,
}

impl TcpClient {
    /// Connect using the client configuration.
    pub async fn connect(addr: &str, config: &ClientConfig) -> Result<Self, NetError> {
        let stream = connect(addr, config).await?;
        let peer = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            peer,
            reader,
            sender: LineSender::new(writer, config.exit_sentinel.clone()),
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Separate the read and write sides.
    pub fn into_split(self) -> (LineReader<OwnedReadHalf>, LineSender) {
        (LineReader::new(self.reader), self.sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn fast_retries(attempts: u32) -> ClientConfig {
        ClientConfig {
            connect_attempts: attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn unreachable_peer_is_connect_error() {
        // Bind then drop to find a port nobody listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let err = connect(&addr.to_string(), &fast_retries(2)).await.unwrap_err();
        assert!(matches!(err, NetError::Connect { .. }));
    }

    #[tokio::test]
    async fn sender_ignores_input_after_sentinel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let client = TcpClient::connect(&addr, &fast_retries(1)).await.unwrap();
        let (mut server, _) = listener.accept().await.unwrap();

        let (_reader, mut sender) = client.into_split();
        assert_eq!(sender.send("hello").await.unwrap(), SendOutcome::Sent);
        assert_eq!(sender.send("  exit ").await.unwrap(), SendOutcome::Closed);
        assert_eq!(sender.send("late").await.unwrap(), SendOutcome::Closed);

        let mut received = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut server, &mut received)
            .await
            .unwrap();
        assert_eq!(received, "hello\n");
    }
}
