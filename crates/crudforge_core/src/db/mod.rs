//! SQLite storage bootstrap, sessions and schema migrations.
//!
//! # Responsibility
//! - Open and configure SQLite connections (the "session" handed to repositories).
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories must not read/write entity tables before migrations succeed.

use thiserror::Error;

pub mod migrations;
mod open;
mod session;

pub use open::{open_db, open_db_in_memory};
pub use session::{SessionFactory, SessionTarget};

pub type DbResult<T> = Result<T, DbError>;

/// A request-scoped unit of work; repositories borrow it.
pub type Session = rusqlite::Connection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("unsupported database url `{0}`; expected sqlite::memory:, sqlite://<path> or a file path")]
    UnsupportedUrl(String),
}
