//! Fluent construction pipeline tying entity creation to validation.
//!
//! # Responsibility
//! - Accumulate a private copy of caller attributes.
//! - Validate them against the registry for (entity, operation).
//! - Produce a fully-populated entity instance.
//!
//! # Invariants
//! - Caller-owned maps are never mutated; the builder clones on input and
//!   again on `build()`, so one builder can produce several instances.
//! - A returned entity passed the registered schema, or no schema exists.
//! - The auto-assigned UUID is a placeholder; repositories replace it on save.

use crate::model::attributes::{AttributeError, AttributeMap};
use crate::model::entity::{AuditFields, Entity, ID_FIELD};
use crate::model::operation::Operation;
use crate::validation::registry::{ValidationError, ValidatorRegistry};
use serde_json::Value;
use std::marker::PhantomData;
use thiserror::Error;
use uuid::Uuid;

/// Failure while building an entity; names the entity type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("cannot build {entity}: {source}")]
    Validation {
        entity: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("cannot build {entity}: {source}")]
    Attribute {
        entity: &'static str,
        #[source]
        source: AttributeError,
    },
}

impl BuildError {
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation { source, .. } => Some(source),
            Self::Attribute { .. } => None,
        }
    }
}

/// Builder bound to one concrete entity type.
pub struct ModelBuilder<'r, E: Entity> {
    registry: &'r ValidatorRegistry,
    operation: Operation,
    attributes: AttributeMap,
    auto_id: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<'r, E: Entity> ModelBuilder<'r, E> {
    /// Starts a builder for `E` with operation `CREATE` and auto-id enabled.
    pub fn for_type(registry: &'r ValidatorRegistry) -> Self {
        Self {
            registry,
            operation: Operation::Create,
            attributes: AttributeMap::new(),
            auto_id: true,
            _entity: PhantomData,
        }
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Merges a copy of `attributes`; later keys overwrite earlier ones.
    pub fn with_attributes(mut self, attributes: &AttributeMap) -> Self {
        for (key, value) in attributes {
            self.attributes.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Disables placeholder id assignment.
    pub fn without_auto_id(mut self) -> Self {
        self.auto_id = false;
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Validates the accumulated attributes and instantiates the entity.
    ///
    /// # Errors
    /// - `BuildError::Validation` when the registered schema rejects the attributes.
    /// - `BuildError::Attribute` when a key cannot be applied to `E`.
    pub fn build(&self) -> Result<E, BuildError> {
        let mut attributes = self.attributes.clone();

        if self.auto_id && !attributes.contains_key(ID_FIELD) {
            attributes.insert(
                ID_FIELD.to_string(),
                Value::String(Uuid::new_v4().to_string()),
            );
        }

        E::unset(&mut attributes);

        self.registry
            .validate::<E>(self.operation, &attributes)
            .map_err(|source| BuildError::Validation {
                entity: E::ENTITY_NAME,
                source,
            })?;

        let mut entity = E::blank(AuditFields::new());
        entity
            .set_attributes(attributes)
            .map_err(|source| BuildError::Attribute {
                entity: E::ENTITY_NAME,
                source,
            })?;
        Ok(entity)
    }
}

impl ValidatorRegistry {
    /// Shorthand for `ModelBuilder::<E>::for_type(self)`.
    pub fn builder<E: Entity>(&self) -> ModelBuilder<'_, E> {
        ModelBuilder::for_type(self)
    }
}
