//! Session factory built from a database connection string.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use rusqlite::Connection;
use std::path::PathBuf;

const MEMORY_URL: &str = "sqlite::memory:";
const SQLITE_SCHEME: &str = "sqlite://";

/// Where sessions connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTarget {
    Memory,
    File(PathBuf),
}

/// Opens migrated connections for one configured database.
///
/// Each call to `open_session` yields an independent connection; for
/// `SessionTarget::Memory` that means an independent empty database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFactory {
    target: SessionTarget,
}

impl SessionFactory {
    /// Parses `sqlite::memory:`, `sqlite://<path>` or a bare file path.
    pub fn from_url(url: &str) -> DbResult<Self> {
        let trimmed = url.trim();
        let target = if trimmed.is_empty() {
            return Err(DbError::UnsupportedUrl(url.to_string()));
        } else if trimmed == MEMORY_URL || trimmed == ":memory:" {
            SessionTarget::Memory
        } else if let Some(path) = trimmed.strip_prefix(SQLITE_SCHEME) {
            if path.is_empty() {
                return Err(DbError::UnsupportedUrl(url.to_string()));
            }
            SessionTarget::File(PathBuf::from(path))
        } else if trimmed.contains("://") {
            return Err(DbError::UnsupportedUrl(url.to_string()));
        } else {
            SessionTarget::File(PathBuf::from(trimmed))
        };
        Ok(Self { target })
    }

    pub fn target(&self) -> &SessionTarget {
        &self.target
    }

    pub fn open_session(&self) -> DbResult<Connection> {
        match &self.target {
            SessionTarget::Memory => open_db_in_memory(),
            SessionTarget::File(path) => open_db(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionFactory, SessionTarget};
    use crate::db::DbError;
    use std::path::PathBuf;

    #[test]
    fn parses_supported_urls() {
        assert_eq!(
            SessionFactory::from_url("sqlite::memory:").unwrap().target(),
            &SessionTarget::Memory
        );
        assert_eq!(
            SessionFactory::from_url("sqlite:///tmp/app.db").unwrap().target(),
            &SessionTarget::File(PathBuf::from("/tmp/app.db"))
        );
        assert_eq!(
            SessionFactory::from_url(" data/app.db ").unwrap().target(),
            &SessionTarget::File(PathBuf::from("data/app.db"))
        );
    }

    #[test]
    fn rejects_foreign_schemes_and_blank_urls() {
        for url in ["postgresql://localhost/app", "", "sqlite://"] {
            assert!(matches!(
                SessionFactory::from_url(url),
                Err(DbError::UnsupportedUrl(_))
            ));
        }
    }
}
