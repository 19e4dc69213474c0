//! Generic entity-persistence core: validated construction, typed CRUD
//! repositories over SQLite and the todo/campaign/user domains built on them.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod settings;
pub mod validation;

pub use db::{
    open_db, open_db_in_memory, DbError, DbResult, Session, SessionFactory, SessionTarget,
};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::attributes::{attributes, AttributeError, AttributeMap};
pub use model::builder::{BuildError, ModelBuilder};
pub use model::campaign::{Campaign, CampaignStatus, CampaignType};
pub use model::entity::{AuditFields, Entity};
pub use model::operation::Operation;
pub use model::todo::Todo;
pub use model::user::User;
pub use repo::base_repo::{RepoError, RepoResult, Repository};
pub use repo::campaign_repo::CampaignRepository;
pub use repo::id::generate_id;
pub use repo::record::SqlEntity;
pub use repo::todo_repo::TodoRepository;
pub use repo::user_repo::UserRepository;
pub use service::user_service::{ServiceError, UserService};
pub use settings::{ConfigError, CoreSettings};
pub use validation::default_registry;
pub use validation::registry::{
    RegistryError, ValidationError, ValidationOutcome, ValidatorRegistry,
};
pub use validation::schema::{FieldChecks, FieldIssue, Schema};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
