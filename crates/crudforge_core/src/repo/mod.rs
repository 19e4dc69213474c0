//! Repository layer: generic persistence gateway and domain repositories.
//!
//! # Responsibility
//! - Keep SQL details inside the core persistence boundary.
//! - Route every update through the validator registry.
//!
//! # Invariants
//! - Persisted ids always come from `id::generate_id()`.
//! - Not-found is a sentinel (`None`/`false`), never an error.

pub mod base_repo;
pub mod campaign_repo;
pub mod encode;
pub mod id;
pub mod record;
pub mod todo_repo;
pub mod user_repo;
