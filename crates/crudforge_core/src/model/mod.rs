//! Domain model: operations, the base entity contract, the model builder and
//! the concrete entities shipped with the template.
//!
//! # Invariants
//! - Every entity embeds `AuditFields` and is built through `ModelBuilder`
//!   or loaded from storage.
//! - Attribute application goes through explicit per-field setters.

pub mod attributes;
pub mod builder;
pub mod campaign;
pub mod entity;
pub mod operation;
pub mod todo;
pub mod user;
