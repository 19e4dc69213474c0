//! Mutation kinds used as validation dispatch keys.
//!
//! # Invariants
//! - The set is closed; adding a schema for a new (entity, operation) pair
//!   needs only a registration, never a registry change.
//! - `as_str()` values are part of the registry key format and must stay stable.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Kind of mutation an attribute set is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    #[default]
    Create,
    Update,
    Delete,
    StateChange,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Update,
        Operation::Delete,
        Operation::StateChange,
    ];

    /// Stable key segment used by the validator registry.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::StateChange => "STATE_CHANGE",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation `{0}`; expected CREATE|UPDATE|DELETE|STATE_CHANGE")]
pub struct ParseOperationError(pub String);

impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "STATE_CHANGE" => Ok(Self::StateChange),
            other => Err(ParseOperationError(other.to_string())),
        }
    }
}
