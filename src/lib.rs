//! netcore: async TCP/UDP servers and clients, a task scheduler, JSON
//! serialization, and request routing over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!     TCP client ──lines──▶  net::tcp  (accept loop, task per connection)
//!     UDP client ──datagrams──▶ net::udp (receive loop, MTU buffer)
//!     HTTP client ──POST /data──▶ http::server ──▶ routing::Router ──▶ handler
//!                                                      │
//!                                       codec (JSON ⇄ DataPayload)
//!
//!     runtime   : named tasks with observable state, on tokio
//!     lifecycle : bind all → serve → signal → drain
//!     config / observability / resilience : cross-cutting
//! ```

// Core subsystems
pub mod codec;
pub mod http;
pub mod net;
pub mod routing;
pub mod runtime;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::NetConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use runtime::Scheduler;
