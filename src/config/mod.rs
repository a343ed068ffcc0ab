//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize, defaults for missing fields)
//!     → validation.rs (semantic checks)
//!     → NetConfig (validated, immutable)
//!     → each section handed to the component it configures
//! ```
//!
//! # Design Decisions
//! - No global addresses: components receive their section at construction
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, parse_config, ConfigError};
pub use schema::{
    ClientConfig, HttpConfig, NetConfig, ObservabilityConfig, RuntimeConfig, RuntimeFlavor,
    TcpConfig, UdpConfig, DEFAULT_MAX_LINE_BYTES, MTU,
};
pub use validation::{validate_config, ValidationError};
