//! JSON encoding and decoding with classified errors.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::error::Category;
use thiserror::Error;

/// Failure turning a value into text.
#[derive(Debug, Error)]
#[error("failed to encode payload: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// Failure turning text into a value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Error)]
pub enum DecodeError {
    /// Not valid JSON, or cut short.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Valid JSON with a value of the wrong type or range.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("unknown field `{0}`")]
    UnknownField(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        match err.classify() {
            // serde_json reports these as "missing field `name`" and
            // "unknown field `name`, expected ..."; payload.rs tests pin both.
            Category::Data => {
                if let Some(field) = message
                    .strip_prefix("missing field ")
                    .and_then(backticked)
                {
                    DecodeError::MissingField(field.to_string())
                } else if let Some(field) = message
                    .strip_prefix("unknown field ")
                    .and_then(backticked)
                {
                    DecodeError::UnknownField(field.to_string())
                } else if message.starts_with("duplicate field") {
                    DecodeError::Malformed(message)
                } else {
                    DecodeError::TypeMismatch(message)
                }
            }
            Category::Syntax | Category::Eof | Category::Io => DecodeError::Malformed(message),
        }
    }
}

/// First `` `name` `` in `text`.
fn backticked(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('`')?;
    let end = rest.find('`')?;
    Some(&rest[..end])
}

/// Serialize `value` to compact JSON. Struct fields keep declaration order.
pub fn encode<T: Serialize>(value: &T) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(value)?)
}

/// Deserialize a value from a JSON object in text form.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, DecodeError> {
    decode_bytes(text.as_bytes())
}

/// Deserialize a value from a JSON object in a byte buffer.
///
/// Only a top-level object is accepted: serde would otherwise fill a struct
/// from a positional array such as `[5,true]`.
pub fn decode_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    require_object(bytes)?;
    Ok(serde_json::from_slice(bytes)?)
}

/// Well-formed JSON that is not an object is a type mismatch.
fn require_object(bytes: &[u8]) -> Result<(), DecodeError> {
    if bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{') {
        return Ok(());
    }
    serde_json::from_slice::<IgnoredAny>(bytes)?;
    Err(DecodeError::TypeMismatch("expected a JSON object".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn backticked_extracts_name() {
        assert_eq!(backticked("`number` at line 1"), Some("number"));
        assert_eq!(backticked("number"), None);
        assert_eq!(backticked("`unterminated"), None);
    }

    #[test]
    fn maps_are_encoded_in_key_order() {
        let mut map = BTreeMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        assert_eq!(encode(&map).unwrap(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn top_level_must_be_an_object() {
        for text in ["[1,2]", "5", " \"a\" ", "null"] {
            let err = decode::<BTreeMap<String, u32>>(text).unwrap_err();
            assert!(matches!(err, DecodeError::TypeMismatch(_)), "{text}: {err:?}");
        }
        let err = decode::<BTreeMap<String, u32>>("[1,").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn leading_whitespace_before_object_is_fine() {
        let map: BTreeMap<String, u32> = decode(" \n{\"a\":1}").unwrap();
        assert_eq!(map["a"], 1);
    }

    #[test]
    fn truncated_input_is_malformed() {
        let err = decode::<BTreeMap<String, u32>>(r#"{"a":"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }
}
