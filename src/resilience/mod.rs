//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Client connect attempt fails:
//!     → backoff.rs (exponential delay with jitter)
//!     → retry until the configured attempt count is spent
//! ```
//!
//! # Design Decisions
//! - Only connection establishment is retried; an established line
//!   stream is never replayed
//! - No automatic read timeouts: a dead peer on a write-only client goes
//!   unnoticed until a write fails

pub mod backoff;

pub use backoff::Backoff;
