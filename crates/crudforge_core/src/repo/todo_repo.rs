//! Todo persistence on top of the generic repository.

use crate::model::entity::AuditFields;
use crate::model::todo::Todo;
use crate::repo::base_repo::{RepoResult, Repository};
use crate::repo::encode::{contains_pattern, flag, text, text_opt};
use crate::repo::record::SqlEntity;
use crate::validation::registry::ValidatorRegistry;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use std::ops::Deref;

impl SqlEntity for Todo {
    const TABLE: &'static str = "todos";
    const COLUMNS: &'static [&'static str] = &["title", "description", "completed"];

    fn to_columns(&self) -> Vec<Value> {
        vec![
            text(&self.title),
            text_opt(self.description.as_deref()),
            flag(self.completed),
        ]
    }

    fn from_columns(audit: AuditFields, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            audit,
            title: row.get("title")?,
            description: row.get("description")?,
            completed: row.get("completed")?,
        })
    }
}

/// Todo repository; base CRUD is reachable through `Deref`.
pub struct TodoRepository<'a> {
    base: Repository<'a, Todo>,
}

impl<'a> TodoRepository<'a> {
    pub fn try_new(conn: &'a Connection, registry: &'a ValidatorRegistry) -> RepoResult<Self> {
        Ok(Self {
            base: Repository::try_new(conn, registry)?,
        })
    }

    pub fn find_by_completed(&self, completed: bool, skip: u32, limit: u32) -> RepoResult<Vec<Todo>> {
        self.base
            .find_where("completed = ?", vec![flag(completed)], skip, limit)
    }

    /// Substring match on `title` (ASCII case-insensitive); `%` and `_` in
    /// `needle` match literally.
    pub fn find_by_title_contains(
        &self,
        needle: &str,
        skip: u32,
        limit: u32,
    ) -> RepoResult<Vec<Todo>> {
        self.base.find_where(
            "title LIKE ? ESCAPE '\\'",
            vec![Value::Text(contains_pattern(needle))],
            skip,
            limit,
        )
    }

    /// Flips `completed`. Returns `None` when `id` does not exist.
    pub fn toggle_completed(&self, id: &str) -> RepoResult<Option<Todo>> {
        let Some(mut todo) = self.base.find(id)? else {
            return Ok(None);
        };
        todo.completed = !todo.completed;
        self.base.persist(&mut todo).map(Some)
    }
}

impl<'a> Deref for TodoRepository<'a> {
    type Target = Repository<'a, Todo>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
