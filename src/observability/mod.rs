//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Peer address and connection ID are attached as fields, not formatted
//!   into messages
//! - HTTP requests carry an `x-request-id` set by middleware

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
