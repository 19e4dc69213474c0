//! Validator registry: (entity type, operation) -> schema dispatch.
//!
//! # Responsibility
//! - Hold one validator per `"{OPERATION}@{Entity}"` key.
//! - Decode attribute maps into the registered schema and run its checks.
//!
//! # Invariants
//! - Registration happens through `&mut self` during start-up; afterwards the
//!   registry is shared read-only, so no locking is needed.
//! - Re-registering a key replaces the previous validator (last one wins).
//! - A missing key is not an error: validation is skipped and a warning is logged.

use crate::model::attributes::AttributeMap;
use crate::model::entity::Entity;
use crate::model::operation::Operation;
use crate::validation::schema::{FieldChecks, FieldIssue, Schema};
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use thiserror::Error;

type ValidatorFn = dyn Fn(&AttributeMap) -> Result<(), Rejection> + Send + Sync;

/// Schema failure before entity/operation context is attached.
enum Rejection {
    Decode(String),
    Issues(Vec<FieldIssue>),
}

/// Attributes did not satisfy the schema registered for (entity, operation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{operation}@{entity}: malformed attributes: {message}")]
    Malformed {
        entity: String,
        operation: Operation,
        message: String,
    },
    #[error("{operation}@{entity}: {}", join_issues(.issues))]
    Rejected {
        entity: String,
        operation: Operation,
        issues: Vec<FieldIssue>,
    },
}

impl ValidationError {
    /// Field-level issues; empty for decode failures.
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::Malformed { .. } => &[],
            Self::Rejected { issues, .. } => issues,
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("entity name is invalid: `{0}`")]
    InvalidEntityName(String),
}

/// Result of a successful `validate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// A schema was registered and the attributes conform to it.
    Validated,
    /// No schema is registered for the key; nothing was checked.
    Skipped,
}

/// Name-keyed lookup of validation schemas.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: BTreeMap<String, Box<ValidatorFn>>,
}

impl Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("keys", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registry key for one (entity, operation) pair.
pub fn registry_key(entity: &str, operation: Operation) -> String {
    format!("{operation}@{entity}")
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers schema `S` for entity type `E` and `operation`.
    pub fn register<E: Entity, S: Schema>(
        &mut self,
        operation: Operation,
    ) -> Result<(), RegistryError> {
        self.register_named::<S>(E::ENTITY_NAME, operation)
    }

    /// Registers schema `S` under an explicit entity name.
    pub fn register_named<S: Schema>(
        &mut self,
        entity: &str,
        operation: Operation,
    ) -> Result<(), RegistryError> {
        let entity = entity.trim();
        if !is_valid_entity_name(entity) {
            return Err(RegistryError::InvalidEntityName(entity.to_string()));
        }

        let key = registry_key(entity, operation);
        let validator: Box<ValidatorFn> = Box::new(|attributes: &AttributeMap| {
            let schema: S = serde_json::from_value(Value::Object(attributes.clone()))
                .map_err(|err| Rejection::Decode(err.to_string()))?;
            let mut checks = FieldChecks::new();
            schema.check(&mut checks);
            if checks.is_empty() {
                Ok(())
            } else {
                Err(Rejection::Issues(checks.into_issues()))
            }
        });

        let status = if self.validators.insert(key.clone(), validator).is_some() {
            "overwrite"
        } else {
            "ok"
        };
        debug!("event=validator_register module=validation status={status} key={key}");
        Ok(())
    }

    /// Validates `attributes` against the schema registered for `E` and `operation`.
    pub fn validate<E: Entity>(
        &self,
        operation: Operation,
        attributes: &AttributeMap,
    ) -> Result<ValidationOutcome, ValidationError> {
        self.validate_named(E::ENTITY_NAME, operation, attributes)
    }

    /// Validates by entity name. Unregistered keys yield `ValidationOutcome::Skipped`.
    pub fn validate_named(
        &self,
        entity: &str,
        operation: Operation,
        attributes: &AttributeMap,
    ) -> Result<ValidationOutcome, ValidationError> {
        let key = registry_key(entity, operation);
        let Some(validator) = self.validators.get(&key) else {
            warn!("event=validation module=validation status=skip key={key} reason=no_schema");
            return Ok(ValidationOutcome::Skipped);
        };

        match validator(attributes) {
            Ok(()) => Ok(ValidationOutcome::Validated),
            Err(Rejection::Decode(message)) => Err(ValidationError::Malformed {
                entity: entity.to_string(),
                operation,
                message,
            }),
            Err(Rejection::Issues(issues)) => Err(ValidationError::Rejected {
                entity: entity.to_string(),
                operation,
                issues,
            }),
        }
    }

    pub fn contains(&self, entity: &str, operation: Operation) -> bool {
        self.validators
            .contains_key(&registry_key(entity, operation))
    }

    /// Returns sorted registry keys.
    pub fn keys(&self) -> Vec<String> {
        self.validators.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

fn is_valid_entity_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
