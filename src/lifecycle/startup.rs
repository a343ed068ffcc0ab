//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind every enabled endpoint before serving anything
//! - Start the metrics exporter when enabled
//! - Spawn one scheduler task per server
//! - On shutdown, stop accepting and drain open connections
//!
//! # Design Decisions
//! - Fail fast: a bind error is fatal and nothing has started yet
//! - Servers start last (traffic only when every bind succeeded)

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::NetConfig;
use crate::http::{app_routes, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::shutdown_signal;
use crate::net::tcp::handler_for;
use crate::net::{ConnectionTracker, Listener, NetError, TcpServer, UdpServer};
use crate::observability::metrics;
use crate::runtime::{self, TaskHandle};

/// How long open TCP connections get to finish after shutdown.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Net(#[from] NetError),

    #[error("invalid metrics address {0}")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Every enabled endpoint, bound but not yet serving.
pub struct Services {
    tcp: Option<TcpServer>,
    udp: Option<UdpServer>,
    http: Option<(HttpServer, TcpListener)>,
}

impl Services {
    /// Bind all enabled endpoints. The first failure aborts startup.
    pub async fn bind(config: &NetConfig) -> Result<Self, StartupError> {
        let tcp = if config.tcp.enabled {
            let listener = Listener::bind(&config.tcp).await?;
            Some(
                TcpServer::new(listener, handler_for(&config.tcp))
                    .with_max_line_bytes(config.tcp.max_line_bytes),
            )
        } else {
            None
        };

        let udp = if config.udp.enabled {
            Some(UdpServer::bind(&config.udp).await?)
        } else {
            None
        };

        let http = if config.http.enabled {
            let server = HttpServer::new(config.http.clone(), app_routes());
            let listener = server.bind().await?;
            Some((server, listener))
        } else {
            None
        };

        Ok(Self { tcp, udp, http })
    }

    pub fn tcp_addr(&self) -> Option<SocketAddr> {
        self.tcp.as_ref().and_then(|s| s.local_addr().ok())
    }

    pub fn udp_addr(&self) -> Option<SocketAddr> {
        self.udp.as_ref().and_then(|s| s.local_addr().ok())
    }

    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http.as_ref().and_then(|(_, l)| l.local_addr().ok())
    }

    /// Spawn a task per bound server.
    pub fn start(self, shutdown: &Shutdown) -> Running {
        let mut tasks = Vec::new();
        let mut tracker = None;

        if let Some(server) = self.tcp {
            tracker = Some(server.tracker());
            tasks.push(runtime::spawn("tcp-server", server.run(shutdown.subscribe())));
        }

        if let Some(server) = self.udp {
            tasks.push(runtime::spawn("udp-server", server.run(shutdown.subscribe())));
        }

        if let Some((server, listener)) = self.http {
            let listener_shutdown = shutdown.subscribe();
            tasks.push(runtime::spawn("http-server", async move {
                if let Err(e) = server.run(listener, listener_shutdown).await {
                    tracing::error!(error = %e, "HTTP server failed");
                }
            }));
        }

        Running { tasks, tracker }
    }
}

/// Servers running as scheduler tasks.
pub struct Running {
    tasks: Vec<TaskHandle<()>>,
    tracker: Option<ConnectionTracker>,
}

impl Running {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every server task, then drain TCP connections.
    ///
    /// Call after triggering shutdown. Returns the connections still open
    /// when `drain_timeout` ran out.
    pub async fn stop(self, drain_timeout: Duration) -> u64 {
        for task in self.tasks {
            let name = task.name().to_string();
            if let Err(e) = task.await {
                tracing::error!(task = %name, error = %e, "Server task did not finish cleanly");
            }
        }

        match self.tracker {
            Some(tracker) => {
                let remaining = tracker.drain(drain_timeout).await;
                if remaining > 0 {
                    tracing::warn!(remaining, "Connections still open after drain timeout");
                }
                remaining
            }
            None => 0,
        }
    }
}

/// Run every enabled server until SIGINT/SIGTERM.
pub async fn run(config: NetConfig) -> Result<(), StartupError> {
    let services = Services::bind(&config).await?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    tracing::info!(
        tcp = ?services.tcp_addr(),
        udp = ?services.udp_addr(),
        http = ?services.http_addr(),
        "Endpoints bound"
    );

    let shutdown = Shutdown::new();
    let running = services.start(&shutdown);

    shutdown_signal().await;
    shutdown.trigger();

    running.stop(DRAIN_TIMEOUT).await;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeral() -> NetConfig {
        let mut config = NetConfig::default();
        config.tcp.bind_address = "127.0.0.1:0".into();
        config.udp.bind_address = "127.0.0.1:0".into();
        config.http.bind_address = "127.0.0.1:0".into();
        config
    }

    #[tokio::test]
    async fn binds_only_enabled_endpoints() {
        let mut config = ephemeral();
        config.udp.enabled = false;

        let services = Services::bind(&config).await.unwrap();
        assert!(services.tcp_addr().is_some());
        assert!(services.udp_addr().is_none());
        assert!(services.http_addr().is_some());
    }

    #[tokio::test]
    async fn bind_conflict_is_fatal() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = ephemeral();
        config.tcp.bind_address = taken.local_addr().unwrap().to_string();

        let err = Services::bind(&config).await.err().unwrap();
        assert!(matches!(err, StartupError::Net(NetError::Bind { .. })));
    }

    #[tokio::test]
    async fn stop_waits_for_every_server() {
        let services = Services::bind(&ephemeral()).await.unwrap();
        let shutdown = Shutdown::new();
        let running = services.start(&shutdown);
        assert_eq!(running.task_count(), 3);

        shutdown.trigger();
        let remaining = tokio::time::timeout(Duration::from_secs(5), running.stop(Duration::from_millis(100)))
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
