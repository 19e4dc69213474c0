//! User persistence and unique-key lookups.

use crate::model::entity::AuditFields;
use crate::model::user::User;
use crate::repo::base_repo::{RepoResult, Repository};
use crate::repo::encode::{flag, text, text_opt};
use crate::repo::record::SqlEntity;
use crate::validation::registry::ValidatorRegistry;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use std::ops::Deref;

impl SqlEntity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "username",
        "email",
        "full_name",
        "hashed_password",
        "is_active",
    ];

    fn to_columns(&self) -> Vec<Value> {
        vec![
            text(&self.username),
            text(&self.email),
            text_opt(self.full_name.as_deref()),
            text(&self.hashed_password),
            flag(self.is_active),
        ]
    }

    fn from_columns(audit: AuditFields, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            audit,
            username: row.get("username")?,
            email: row.get("email")?,
            full_name: row.get("full_name")?,
            hashed_password: row.get("hashed_password")?,
            is_active: row.get("is_active")?,
            password: None,
        })
    }
}

/// User repository; base CRUD is reachable through `Deref`.
pub struct UserRepository<'a> {
    base: Repository<'a, User>,
}

impl<'a> UserRepository<'a> {
    pub fn try_new(conn: &'a Connection, registry: &'a ValidatorRegistry) -> RepoResult<Self> {
        Ok(Self {
            base: Repository::try_new(conn, registry)?,
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.first_where("username = ?", username)
    }

    pub fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.first_where("email = ?", email)
    }

    fn first_where(&self, filter: &str, value: &str) -> RepoResult<Option<User>> {
        Ok(self
            .base
            .find_where(filter, vec![text(value)], 0, 1)?
            .into_iter()
            .next())
    }
}

impl<'a> Deref for UserRepository<'a> {
    type Target = Repository<'a, User>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
