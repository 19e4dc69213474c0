//! Layered settings: built-in defaults, optional TOML file, `CRUDFORGE_*` env.

use crate::db::{DbResult, SessionFactory};
use crate::logging::{default_log_level, LogConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PREFIX: &str = "CRUDFORGE";
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

/// Settings consumed by the core: a database URL and logging options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoreSettings {
    pub database_url: String,
    pub log_level: String,
    /// File logging is disabled when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl CoreSettings {
    /// Loads settings; a missing `file` is not an error.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("log_level", default_log_level())?;
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(false));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn session_factory(&self) -> DbResult<SessionFactory> {
        SessionFactory::from_url(&self.database_url)
    }

    /// Logger settings, or `None` when no log directory is configured.
    pub fn log_config(&self) -> Option<LogConfig> {
        self.log_dir
            .as_ref()
            .map(|dir| LogConfig::new(self.log_level.clone(), dir.clone()))
    }
}
