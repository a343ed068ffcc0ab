//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

use netcore::config::{ClientConfig, NetConfig, TcpConfig};
use netcore::http::{app_routes, HttpServer};
use netcore::lifecycle::Shutdown;
use netcore::net::{ConnectionTracker, Listener, TcpServer};
use netcore::runtime::{self, TaskHandle};

/// Upper bound for any single network step in a test.
pub const STEP: Duration = Duration::from_secs(5);

/// Default configuration with every endpoint on an ephemeral port.
pub fn ephemeral_config() -> NetConfig {
    let mut config = NetConfig::default();
    config.tcp.bind_address = "127.0.0.1:0".into();
    config.udp.bind_address = "127.0.0.1:0".into();
    config.http.bind_address = "127.0.0.1:0".into();
    config
}

/// Client settings that give up quickly.
pub fn fast_client() -> ClientConfig {
    ClientConfig {
        connect_attempts: 2,
        base_delay_ms: 10,
        max_delay_ms: 20,
        ..ClientConfig::default()
    }
}

pub struct RunningTcp {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub tracker: ConnectionTracker,
    pub task: TaskHandle<()>,
}

/// Start a TCP line server on an ephemeral port.
pub async fn start_tcp(echo: bool) -> RunningTcp {
    start_tcp_with(TcpConfig {
        echo,
        ..TcpConfig::default()
    })
    .await
}

/// Start a TCP line server from `config`, rebound to an ephemeral port.
pub async fn start_tcp_with(mut config: TcpConfig) -> RunningTcp {
    config.bind_address = "127.0.0.1:0".into();
    let listener = Listener::bind(&config).await.unwrap();
    let server = TcpServer::new(listener, netcore::net::tcp::handler_for(&config))
        .with_max_line_bytes(config.max_line_bytes);
    let addr = server.local_addr().unwrap();
    let tracker = server.tracker();
    let shutdown = Shutdown::new();
    let task = runtime::spawn("test-tcp-server", server.run(shutdown.subscribe()));
    RunningTcp {
        addr,
        shutdown,
        tracker,
        task,
    }
}

/// Start the HTTP data endpoint on an ephemeral port.
pub async fn start_http() -> (SocketAddr, Shutdown) {
    let config = ephemeral_config();
    let server = HttpServer::new(config.http, app_routes());
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let listener_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, listener_shutdown).await.unwrap();
    });
    (addr, shutdown)
}

/// Read one line (without terminator) from a raw stream.
pub async fn read_line(reader: &mut BufReader<TcpStream>) -> Option<String> {
    let mut line = String::new();
    let n = tokio::time::timeout(STEP, reader.read_line(&mut line))
        .await
        .unwrap()
        .unwrap();
    if n == 0 {
        None
    } else {
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
