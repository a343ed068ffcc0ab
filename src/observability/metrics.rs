//! Metrics collection and exposition.
//!
//! # Metrics
//! - `netcore_tcp_connections_total` (counter): accepted TCP connections
//! - `netcore_tcp_active_connections` (gauge): open TCP connections
//! - `netcore_tcp_lines_total` (counter): lines received
//! - `netcore_udp_datagrams_total` (counter): datagrams by `truncated`
//! - `netcore_http_requests_total` (counter): requests by route, status
//! - `netcore_http_request_duration_seconds` (histogram): request latency
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint. Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_connection_opened() {
    counter!("netcore_tcp_connections_total").increment(1);
    gauge!("netcore_tcp_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    gauge!("netcore_tcp_active_connections").decrement(1.0);
}

pub fn record_line_received() {
    counter!("netcore_tcp_lines_total").increment(1);
}

pub fn record_datagram(truncated: bool) {
    let truncated = if truncated { "true" } else { "false" };
    counter!("netcore_udp_datagrams_total", "truncated" => truncated).increment(1);
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!(
        "netcore_http_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("netcore_http_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}
