//! Row mapping contract between entities and their SQLite tables.

use crate::model::entity::{AuditFields, Entity};
use crate::repo::base_repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;

/// Audit columns present on every entity table, in storage order.
pub const AUDIT_COLUMNS: &[&str] = &[
    "id",
    "created_at",
    "created_by",
    "updated_at",
    "deleted_at",
    "deleted_by",
];

/// An entity stored in one SQLite table.
///
/// Implementors describe only their domain columns; audit columns are read
/// and written by the base repository.
pub trait SqlEntity: Entity {
    const TABLE: &'static str;

    /// Domain columns, in the order produced by `to_columns`.
    const COLUMNS: &'static [&'static str];

    fn to_columns(&self) -> Vec<Value>;

    /// Rebuilds the entity from a row that contains every `COLUMNS` entry.
    fn from_columns(audit: AuditFields, row: &Row<'_>) -> RepoResult<Self>;
}
