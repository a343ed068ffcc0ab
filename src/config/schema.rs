//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! servers and clients. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Largest datagram payload a typical Ethernet link carries unfragmented.
pub const MTU: usize = 1500;

/// Default cap on one TCP line, terminator included.
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NetConfig {
    /// Line-oriented TCP server.
    pub tcp: TcpConfig,

    /// Datagram server.
    pub udp: UdpConfig,

    /// Request/response (HTTP) server.
    pub http: HttpConfig,

    /// Settings shared by the client commands.
    pub client: ClientConfig,

    /// Scheduler runtime settings.
    pub runtime: RuntimeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// TCP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TcpConfig {
    /// Start the TCP server.
    pub enabled: bool,

    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Longest accepted line in bytes, terminator included. A longer line
    /// ends the connection.
    pub max_line_bytes: usize,

    /// Write every received line back to its sender.
    pub echo: bool,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8080".to_string(),
            max_connections: 10_000,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            echo: false,
        }
    }
}

/// UDP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UdpConfig {
    /// Start the UDP server.
    pub enabled: bool,

    /// Bind address (e.g., "127.0.0.1:8081").
    pub bind_address: String,

    /// Receive buffer size. Larger datagrams are truncated.
    pub buffer_size: usize,

    /// Send every received datagram back to its sender.
    pub echo: bool,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8081".to_string(),
            buffer_size: MTU,
            echo: false,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Start the HTTP server.
    pub enabled: bool,

    /// Bind address (e.g., "127.0.0.1:3030").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub body_limit_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:3030".to_string(),
            body_limit_bytes: 64 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// TCP server to connect to.
    pub tcp_address: String,

    /// UDP server to send datagrams to.
    pub udp_address: String,

    /// Base URL of the HTTP server.
    pub http_url: String,

    /// Local address for the UDP client. Port 0 lets the OS pick.
    pub udp_local_address: String,

    /// Input line that ends a send loop.
    pub exit_sentinel: String,

    /// Connection attempts before giving up.
    pub connect_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tcp_address: "127.0.0.1:8080".to_string(),
            udp_address: "127.0.0.1:8081".to_string(),
            http_url: "http://127.0.0.1:3030".to_string(),
            udp_local_address: "0.0.0.0:0".to_string(),
            exit_sentinel: "exit".to_string(),
            connect_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Which tokio scheduler drives the tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeFlavor {
    /// Many tasks over a pool of worker threads.
    MultiThread,
    /// Every task on the thread that drives the runtime.
    CurrentThread,
}

/// Scheduler runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub flavor: RuntimeFlavor,

    /// Worker thread count for `multi_thread`. Defaults to one per core.
    pub worker_threads: Option<usize>,

    /// Name given to worker threads.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            flavor: RuntimeFlavor::MultiThread,
            worker_threads: None,
            thread_name: "netcore-worker".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
