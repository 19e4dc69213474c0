//! User account use-cases.
//!
//! # Responsibility
//! - Enforce username/email uniqueness before writes.
//! - Hash passwords with argon2 so plain text never reaches storage.
//! - Address users by username rather than by id.
//!
//! # Invariants
//! - Stored `hashed_password` values are argon2 PHC strings.
//! - `password` is validated as plain text and hashed before `update` runs.
//! - `update` only touches the keys listed in `UserUpdate::FIELDS`.

use crate::model::attributes::{AttributeError, AttributeMap};
use crate::model::builder::BuildError;
use crate::model::operation::Operation;
use crate::model::entity::Entity;
use crate::model::user::{User, UserUpdate};
use crate::repo::base_repo::RepoError;
use crate::repo::user_repo::UserRepository;
use crate::validation::registry::ValidationError;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use log::{info, warn};
use rand_core::OsRng;
use serde_json::Value;
use thiserror::Error;

const PASSWORD_KEY: &str = "password";
const HASHED_PASSWORD_KEY: &str = "hashed_password";

/// Service error for user use-cases.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("username `{0}` is already registered")]
    UsernameTaken(String),
    #[error("email `{0}` is already registered")]
    EmailTaken(String),
    #[error("password is required")]
    MissingPassword,
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// User service facade over a user repository.
pub struct UserService<'a> {
    repo: UserRepository<'a>,
}

impl<'a> UserService<'a> {
    pub fn new(repo: UserRepository<'a>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &UserRepository<'a> {
        &self.repo
    }

    /// Builds, de-duplicates, hashes and stores a new user.
    ///
    /// # Errors
    /// - `Build` when attributes fail the `CREATE` schema.
    /// - `UsernameTaken` / `EmailTaken` on a uniqueness clash.
    pub fn create_user(&self, attributes: &AttributeMap) -> ServiceResult<User> {
        let mut user: User = self
            .repo
            .registry()
            .builder::<User>()
            .with_operation(Operation::Create)
            .with_attributes(attributes)
            .build()?;

        if self.repo.get_user_by_username(&user.username)?.is_some() {
            warn!(
                "event=user_create module=service status=conflict field=username username={}",
                user.username
            );
            return Err(ServiceError::UsernameTaken(user.username));
        }
        if self.repo.get_user_by_email(&user.email)?.is_some() {
            warn!("event=user_create module=service status=conflict field=email");
            return Err(ServiceError::EmailTaken(user.email));
        }

        let password = user.password.take().ok_or(ServiceError::MissingPassword)?;
        user.hashed_password = hash_password(&password)?;

        let saved = self.repo.save(user)?;
        info!(
            "event=user_create module=service status=ok id={} username={}",
            saved.audit.id, saved.username
        );
        Ok(saved)
    }

    /// Returns the user when `password` matches the stored hash.
    pub fn authenticate_user(&self, username: &str, password: &str) -> ServiceResult<Option<User>> {
        let Some(user) = self.repo.get_user_by_username(username)? else {
            return Ok(None);
        };
        if !verify_password(password, &user.hashed_password) {
            warn!("event=user_auth module=service status=denied username={username}");
            return Ok(None);
        }
        Ok(Some(user))
    }

    pub fn get_user_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        Ok(self.repo.get_user_by_username(username)?)
    }

    /// Applies a partial update to the user named `username`.
    ///
    /// Only `email`, `password` and `full_name` are accepted. A plain
    /// `password` is validated, then stored as `hashed_password`. A null
    /// `email` or `password` leaves the stored value unchanged.
    ///
    /// # Errors
    /// - `Attribute(UnknownField)` for any other key; nothing is written.
    pub fn update(&self, username: &str, attributes: &AttributeMap) -> ServiceResult<Option<User>> {
        if let Some(key) = attributes
            .keys()
            .find(|key| !UserUpdate::FIELDS.contains(&key.as_str()))
        {
            warn!("event=user_update module=service status=rejected field={key}");
            return Err(AttributeError::UnknownField {
                entity: User::ENTITY_NAME,
                field: key.clone(),
            }
            .into());
        }

        let Some(user) = self.repo.get_user_by_username(username)? else {
            return Ok(None);
        };

        self.repo
            .registry()
            .validate::<User>(Operation::Update, attributes)?;

        let mut changes: AttributeMap = attributes
            .iter()
            .filter(|(key, value)| !(value.is_null() && key.as_str() != "full_name"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if let Some(email) = changes.get("email").and_then(Value::as_str) {
            if email != user.email && self.repo.get_user_by_email(email)?.is_some() {
                return Err(ServiceError::EmailTaken(email.to_string()));
            }
        }
        if let Some(password) = changes.remove(PASSWORD_KEY) {
            let password = password.as_str().ok_or(ServiceError::MissingPassword)?;
            changes.insert(
                HASHED_PASSWORD_KEY.to_string(),
                Value::String(hash_password(password)?),
            );
        }

        Ok(self.repo.update(&user.audit.id, &changes)?)
    }

    /// Removes the user named `username`. Returns `false` when absent.
    pub fn delete(&self, username: &str) -> ServiceResult<bool> {
        let Some(user) = self.repo.get_user_by_username(username)? else {
            return Ok(false);
        };
        Ok(self.repo.delete(&user.audit.id)?)
    }

    pub fn list_users(&self, skip: u32, limit: u32) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_all(skip, limit)?)
    }
}

/// Hashes `password` into an argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Hash(err.to_string()))
}

/// `false` for mismatches and for unparseable stored hashes.
pub fn verify_password(password: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_verifies_only_the_original_password() {
        let phc = hash_password("Corr3ct!horse").unwrap();
        assert!(phc.starts_with("$argon2id$"));
        assert!(verify_password("Corr3ct!horse", &phc));
        assert!(!verify_password("wrong", &phc));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
