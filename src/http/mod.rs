//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, buffer body up to the limit)
//!     → routing::Router (first matching route)
//!     → handlers.rs (application routes)
//!     → response.rs (rejection → 404 / 405 / 400)
//!     → Send to client
//! ```

pub mod client;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use client::{ClientError, ClientReply, DataClient};
pub use handlers::app_routes;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
