//! Attribute validation keyed by (entity type, operation).

pub mod registry;
pub mod schema;

use crate::model::campaign::register_campaign_schemas;
use crate::model::todo::register_todo_schemas;
use crate::model::user::register_user_schemas;
use registry::{RegistryError, ValidatorRegistry};

/// Builds a registry holding every schema shipped with the core.
///
/// Call once at process start and share the result read-only.
pub fn default_registry() -> Result<ValidatorRegistry, RegistryError> {
    let mut registry = ValidatorRegistry::new();
    register_todo_schemas(&mut registry)?;
    register_user_schemas(&mut registry)?;
    register_campaign_schemas(&mut registry)?;
    Ok(registry)
}
