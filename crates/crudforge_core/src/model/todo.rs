//! Todo entity and its CREATE/UPDATE schemas.

use crate::model::attributes::{decode, AttributeError};
use crate::model::entity::{AuditFields, Entity};
use crate::model::operation::Operation;
use crate::validation::registry::{RegistryError, ValidatorRegistry};
use crate::validation::schema::{FieldChecks, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(flatten)]
    pub audit: AuditFields,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

impl Entity for Todo {
    const ENTITY_NAME: &'static str = "Todo";

    fn blank(audit: AuditFields) -> Self {
        Self {
            audit,
            title: String::new(),
            description: None,
            completed: false,
        }
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn set_field(&mut self, key: &str, value: Value) -> Result<(), AttributeError> {
        match key {
            "title" => self.title = decode(key, value)?,
            "description" => self.description = decode(key, value)?,
            "completed" => self.completed = decode(key, value)?,
            other => {
                return Err(AttributeError::UnknownField {
                    entity: Self::ENTITY_NAME,
                    field: other.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Attributes accepted when creating a todo.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl Schema for TodoCreate {
    fn check(&self, checks: &mut FieldChecks) {
        checks
            .length("title", &self.title, 1, TITLE_MAX_CHARS)
            .length("description", &self.description, 0, DESCRIPTION_MAX_CHARS);
    }
}

/// Attributes accepted when updating a todo; every field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl Schema for TodoUpdate {
    fn check(&self, checks: &mut FieldChecks) {
        checks
            .length_opt("title", self.title.as_deref(), 1, TITLE_MAX_CHARS)
            .length_opt(
                "description",
                self.description.as_deref(),
                0,
                DESCRIPTION_MAX_CHARS,
            );
    }
}

pub fn register_todo_schemas(registry: &mut ValidatorRegistry) -> Result<(), RegistryError> {
    registry.register::<Todo, TodoCreate>(Operation::Create)?;
    registry.register::<Todo, TodoUpdate>(Operation::Update)?;
    Ok(())
}
