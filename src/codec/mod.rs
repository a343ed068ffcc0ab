//! Serialization layer.
//!
//! Structured values ⇄ JSON text. Objects are keyed by field name so any
//! JSON implementation can interoperate; unknown and missing fields fail
//! instead of falling back to defaults.

pub mod json;
pub mod payload;

pub use json::{decode, decode_bytes, encode, DecodeError, EncodeError};
pub use payload::DataPayload;
