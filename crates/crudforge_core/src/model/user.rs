//! User account entity and its CREATE/UPDATE schemas.
//!
//! # Invariants
//! - `password` is transient: it is never written to storage and is cleared
//!   once the service has hashed it.
//! - `hashed_password` cannot be assigned through builder attributes.

use crate::model::attributes::{decode, AttributeError};
use crate::model::entity::{AuditFields, Entity};
use crate::model::operation::Operation;
use crate::validation::registry::{RegistryError, ValidatorRegistry};
use crate::validation::schema::{FieldChecks, Schema};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 8;

const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub audit: AuditFields,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_active: bool,
    /// Plain-text password awaiting hashing; never persisted.
    #[serde(skip)]
    pub password: Option<String>,
}

impl Entity for User {
    const ENTITY_NAME: &'static str = "User";
    const UNSET: &'static [&'static str] = &["hashed_password"];

    fn blank(audit: AuditFields) -> Self {
        Self {
            audit,
            username: String::new(),
            email: String::new(),
            full_name: None,
            hashed_password: String::new(),
            is_active: true,
            password: None,
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
            "username" => self.username = decode(key, value)?,
            "email" => self.email = decode(key, value)?,
            "full_name" => self.full_name = decode(key, value)?,
            "hashed_password" => self.hashed_password = decode(key, value)?,
            "is_active" => self.is_active = decode(key, value)?,
            "password" => self.password = decode(key, value)?,
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

fn check_email(checks: &mut FieldChecks, email: &str) {
    checks.matches("email", email, &EMAIL_RE, "must be a valid email address");
}

fn check_password(checks: &mut FieldChecks, password: &str) {
    checks
        .ensure(
            "password",
            password.chars().count() >= PASSWORD_MIN_CHARS,
            format!("must be at least {PASSWORD_MIN_CHARS} characters long"),
        )
        .ensure(
            "password",
            password.chars().any(|c| c.is_ascii_uppercase()),
            "must contain at least one uppercase letter",
        )
        .ensure(
            "password",
            password.chars().any(|c| c.is_ascii_lowercase()),
            "must contain at least one lowercase letter",
        )
        .ensure(
            "password",
            password.chars().any(|c| c.is_ascii_digit()),
            "must contain at least one number",
        )
        .ensure(
            "password",
            password.chars().any(|c| PASSWORD_SPECIALS.contains(c)),
            "must contain at least one special character",
        );
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl Schema for UserCreate {
    fn check(&self, checks: &mut FieldChecks) {
        checks
            .matches(
                "username",
                &self.username,
                &USERNAME_RE,
                "may only contain letters, digits, underscores and hyphens",
            )
            .length(
                "username",
                &self.username,
                USERNAME_MIN_CHARS,
                USERNAME_MAX_CHARS,
            );
        check_email(checks, &self.email);
        check_password(checks, &self.password);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

impl UserUpdate {
    /// Keys a user may change after registration.
    pub const FIELDS: &'static [&'static str] = &["email", "password", "full_name"];
}

impl Schema for UserUpdate {
    fn check(&self, checks: &mut FieldChecks) {
        if let Some(email) = &self.email {
            check_email(checks, email);
        }
        if let Some(password) = &self.password {
            check_password(checks, password);
        }
    }
}

pub fn register_user_schemas(registry: &mut ValidatorRegistry) -> Result<(), RegistryError> {
    registry.register::<User, UserCreate>(Operation::Create)?;
    registry.register::<User, UserUpdate>(Operation::Update)?;
    Ok(())
}
