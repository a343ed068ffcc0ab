//! Transport error taxonomy.

use std::io;

use thiserror::Error;

/// Errors raised by listeners, connections and clients.
#[derive(Debug, Error)]
pub enum NetError {
    /// The address is unavailable or invalid. Fatal at server startup.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The peer could not be reached.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Read, write, accept or shutdown failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl NetError {
    pub(crate) fn bind(addr: impl Into<String>, source: io::Error) -> Self {
        NetError::Bind {
            addr: addr.into(),
            source,
        }
    }

    /// The underlying I/O error kind.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            NetError::Bind { source, .. } | NetError::Connect { source, .. } => source.kind(),
            NetError::Io(e) => e.kind(),
        }
    }

    /// True when the peer went away rather than something failing locally.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
        )
    }
}
