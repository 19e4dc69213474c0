//! Use-case services layered over repositories.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own rules that span more than one row (uniqueness, credential hashing).

pub mod user_service;
