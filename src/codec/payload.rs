//! The request envelope carried by `POST /data`.

use serde::{Deserialize, Serialize};

/// Two-field request body. Both fields are required and no others are
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataPayload {
    pub number: u32,
    pub boolean: bool,
}

impl DataPayload {
    pub fn new(number: u32, boolean: bool) -> Self {
        Self { number, boolean }
    }
}
