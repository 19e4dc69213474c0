//! Attribute dictionaries and typed field decoding.
//!
//! # Responsibility
//! - Define the loosely-typed attribute map accepted by builders/repositories.
//! - Decode one JSON attribute value into the concrete field type of an entity.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw attribute dictionary keyed by field name.
pub type AttributeMap = Map<String, Value>;

/// Errors raised while applying attributes onto an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("unknown field `{field}` for {entity}")]
    UnknownField { entity: &'static str, field: String },
    #[error("invalid value for `{field}`: {message}")]
    InvalidValue { field: String, message: String },
    #[error("field `{0}` cannot be changed after creation")]
    Immutable(String),
}

/// Decodes one attribute value into `T`.
pub fn decode<T: DeserializeOwned>(field: &str, value: Value) -> Result<T, AttributeError> {
    serde_json::from_value(value).map_err(|err| AttributeError::InvalidValue {
        field: field.to_string(),
        message: err.to_string(),
    })
}

/// Builds an attribute map from `(key, value)` pairs.
pub fn attributes<K, I>(pairs: I) -> AttributeMap
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value))
        .collect()
}
