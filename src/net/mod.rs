//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! TCP:
//!     listener.rs (bind, accept loop, connection limits)
//!     → connection.rs (split halves, lifecycle tracking)
//!     → framing.rs (newline-delimited lines)
//!     → tcp.rs (per-connection loop, LineHandler)
//!
//! UDP:
//!     udp.rs (bind, receive into MTU buffer, send_to)
//!
//! Clients:
//!     client.rs (TCP connect with backoff, sentinel-terminated send loop)
//!     udp.rs (UdpClient, ephemeral local port)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Per-connection errors never reach the accept loop

pub mod client;
pub mod connection;
pub mod error;
pub mod framing;
pub mod listener;
pub mod tcp;
pub mod udp;

pub use client::{LineSender, SendOutcome, TcpClient};
pub use connection::{Connection, ConnectionId, ConnectionState, ConnectionTracker};
pub use error::NetError;
pub use listener::Listener;
pub use tcp::{serve_connection, ConnectionEnd, EchoLines, LineHandler, LogLines, TcpServer};
pub use udp::{Datagram, UdpClient, UdpEndpoint, UdpServer};
