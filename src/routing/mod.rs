//! Application protocol routing.
//!
//! # Data Flow
//! ```text
//! IncomingRequest (method, path, buffered body)
//!     → router.rs (routes in registration order)
//!     → matcher.rs (path ∧ method ∧ payload decodes)
//!     → first accepting route's handler → Reply
//!     → or the most specific Rejection
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)
//! - Explicit rejection rather than silent default

pub mod matcher;
pub mod router;

pub use matcher::{
    json_body, method, path, AndMatcher, IncomingRequest, JsonBodyMatcher, Matcher, MethodMatcher,
    PathMatcher, Rejection,
};
pub use router::{Reply, Route, Router};
