//! Configuration validation.
//!
//! Serde handles syntax; this module checks values: addresses parse,
//! limits are positive, backoff delays are ordered. Every problem is
//! reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::NetConfig;

/// Largest payload a UDP datagram over IPv4 can carry.
const MAX_UDP_PAYLOAD: usize = 65_507;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a socket address (host:port)")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: '{value}' is not an http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("udp.buffer_size {0} exceeds the largest UDP payload ({max})", max = MAX_UDP_PAYLOAD)]
    BufferTooLarge(usize),

    #[error("client.exit_sentinel must not be empty")]
    EmptySentinel,

    #[error("client.base_delay_ms ({base}) exceeds client.max_delay_ms ({max})")]
    DelayOrder { base: u64, max: u64 },
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &NetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let addresses = [
        ("tcp.bind_address", &config.tcp.bind_address),
        ("udp.bind_address", &config.udp.bind_address),
        ("http.bind_address", &config.http.bind_address),
        ("client.tcp_address", &config.client.tcp_address),
        ("client.udp_address", &config.client.udp_address),
        ("client.udp_local_address", &config.client.udp_local_address),
        ("observability.metrics_address", &config.observability.metrics_address),
    ];
    for (field, value) in addresses {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field,
                value: value.clone(),
            });
        }
    }

    let url = &config.client.http_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(ValidationError::InvalidUrl {
            field: "client.http_url",
            value: url.clone(),
        });
    }

    if config.tcp.max_connections == 0 {
        errors.push(ValidationError::Zero { field: "tcp.max_connections" });
    }
    if config.tcp.max_line_bytes == 0 {
        errors.push(ValidationError::Zero { field: "tcp.max_line_bytes" });
    }
    if config.udp.buffer_size == 0 {
        errors.push(ValidationError::Zero { field: "udp.buffer_size" });
    } else if config.udp.buffer_size > MAX_UDP_PAYLOAD {
        errors.push(ValidationError::BufferTooLarge(config.udp.buffer_size));
    }
    if config.http.body_limit_bytes == 0 {
        errors.push(ValidationError::Zero { field: "http.body_limit_bytes" });
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "http.request_timeout_secs" });
    }
    if config.runtime.worker_threads == Some(0) {
        errors.push(ValidationError::Zero { field: "runtime.worker_threads" });
    }
    if config.client.connect_attempts == 0 {
        errors.push(ValidationError::Zero { field: "client.connect_attempts" });
    }
    if config.client.exit_sentinel.trim().is_empty() {
        errors.push(ValidationError::EmptySentinel);
    }
    if config.client.base_delay_ms > config.client.max_delay_ms {
        errors.push(ValidationError::DelayOrder {
            base: config.client.base_delay_ms,
            max: config.client.max_delay_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&NetConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_error() {
        let mut config = NetConfig::default();
        config.tcp.bind_address = "not-an-address".into();
        config.udp.buffer_size = 70_000;
        config.client.exit_sentinel = "  ".into();
        config.runtime.worker_threads = Some(0);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidAddress {
            field: "tcp.bind_address",
            value: "not-an-address".into(),
        }));
        assert!(errors.contains(&ValidationError::BufferTooLarge(70_000)));
        assert!(errors.contains(&ValidationError::EmptySentinel));
    }

    #[test]
    fn rejects_zero_line_limit() {
        let mut config = NetConfig::default();
        config.tcp.max_line_bytes = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::Zero { field: "tcp.max_line_bytes" }]);
    }

    #[test]
    fn rejects_inverted_backoff() {
        let mut config = NetConfig::default();
        config.client.base_delay_ms = 5_000;
        config.client.max_delay_ms = 100;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::DelayOrder { base: 5_000, max: 100 }]);
    }
}
