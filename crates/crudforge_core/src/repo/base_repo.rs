//! Generic CRUD gateway over one entity table.
//!
//! # Responsibility
//! - Assign persisted ids and write entities inside a transaction.
//! - Re-validate partial attributes before applying updates.
//! - Provide point lookup and offset/limit pagination.
//!
//! # Invariants
//! - `save` always replaces the entity id with a fresh `generate_id()` value.
//! - `update` validates through the registry before any mutation; `id` and
//!   `created_at` are never changed by it.
//! - `delete` is physical: the row is removed and the soft-delete audit
//!   columns are never written.
//! - Every write runs in its own transaction and rolls back on failure.
//! - Missing rows are reported as `None`/`false`, never as errors.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::attributes::{AttributeError, AttributeMap};
use crate::model::entity::{AuditFields, ID_FIELD};
use crate::model::operation::Operation;
use crate::repo::encode::{decode_dt, decode_dt_opt, encode_dt, encode_dt_opt, text, text_opt};
use crate::repo::id::generate_id;
use crate::repo::record::{SqlEntity, AUDIT_COLUMNS};
use crate::validation::registry::{ValidationError, ValidatorRegistry};
use log::{debug, error};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::marker::PhantomData;
use thiserror::Error;

/// Attribute keys `update` refuses to apply.
const IMMUTABLE_ON_UPDATE: &[&str] = &[ID_FIELD, "created_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("connection schema version {actual_version} is behind required {expected_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// SQLite-backed repository for entity type `E`.
///
/// Borrows a caller-owned connection (the request-scoped session) and the
/// process validator registry.
pub struct Repository<'a, E: SqlEntity> {
    conn: &'a Connection,
    registry: &'a ValidatorRegistry,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: SqlEntity> Repository<'a, E> {
    /// Constructs a repository from a migrated connection holding `E::TABLE`.
    pub fn try_new(conn: &'a Connection, registry: &'a ValidatorRegistry) -> RepoResult<Self> {
        ensure_connection_ready::<E>(conn)?;
        Ok(Self {
            conn,
            registry,
            _entity: PhantomData,
        })
    }

    pub fn connection(&self) -> &'a Connection {
        self.conn
    }

    pub fn registry(&self) -> &'a ValidatorRegistry {
        self.registry
    }

    /// Generates a persisted id; see `repo::id`.
    pub fn generate_id() -> String {
        generate_id()
    }

    /// Assigns a fresh id, inserts the entity and returns the stored row.
    ///
    /// Any id already present on `entity` is discarded.
    pub fn save(&self, mut entity: E) -> RepoResult<E> {
        let id = generate_id();
        entity.audit_mut().id = id.clone();

        self.in_transaction("entity_save", &id, |tx| insert_row(tx, &entity))?;
        self.reload(&id)
    }

    /// Validates `attributes` as `UPDATE` and applies them to the stored entity.
    ///
    /// Returns `Ok(None)` without side effects when `id` does not exist.
    pub fn update(&self, id: &str, attributes: &AttributeMap) -> RepoResult<Option<E>> {
        self.update_with(id, attributes, Operation::Update)
    }

    /// Same as `update`, validating against the schema for `operation`.
    pub fn update_with(
        &self,
        id: &str,
        attributes: &AttributeMap,
        operation: Operation,
    ) -> RepoResult<Option<E>> {
        let Some(mut entity) = self.find(id)? else {
            return Ok(None);
        };

        self.registry.validate::<E>(operation, attributes)?;

        for (key, value) in attributes {
            if IMMUTABLE_ON_UPDATE.contains(&key.as_str()) {
                return Err(AttributeError::Immutable(key.clone()).into());
            }
            entity.set_attribute(key, value.clone())?;
        }

        self.persist(&mut entity).map(Some)
    }

    /// Writes the current in-memory state of an already-stored entity.
    ///
    /// Used by domain helpers that mutate fields directly (e.g. toggles).
    pub fn persist(&self, entity: &mut E) -> RepoResult<E> {
        entity.audit_mut().touch();
        let id = entity.id().to_string();
        self.in_transaction("entity_update", &id, |tx| update_row(tx, entity))?;
        self.reload(&id)
    }

    /// Physically removes the row. Returns `false` when `id` does not exist.
    pub fn delete(&self, id: &str) -> RepoResult<bool> {
        if self.find(id)?.is_none() {
            return Ok(false);
        }

        let sql = format!("DELETE FROM {} WHERE id = ?1;", E::TABLE);
        self.in_transaction("entity_delete", id, |tx| {
            tx.execute(&sql, [id])?;
            Ok(())
        })?;
        Ok(true)
    }

    pub fn find(&self, id: &str) -> RepoResult<Option<E>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1;", select_sql::<E>()))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_row::<E>(row)?)),
            None => Ok(None),
        }
    }

    /// Offset/limit page ordered by id (creation order for generated ids).
    ///
    /// `limit` is not capped.
    pub fn find_all(&self, skip: u32, limit: u32) -> RepoResult<Vec<E>> {
        self.find_where("1 = 1", Vec::new(), skip, limit)
    }

    /// Page of rows matching a SQL `filter` with positional `?` parameters.
    ///
    /// `filter` must be a trusted, static fragment; values go through `params`.
    pub fn find_where(
        &self,
        filter: &str,
        params: Vec<Value>,
        skip: u32,
        limit: u32,
    ) -> RepoResult<Vec<E>> {
        let sql = format!(
            "{} WHERE {filter} ORDER BY id ASC LIMIT ? OFFSET ?;",
            select_sql::<E>()
        );
        let mut bind_values = params;
        bind_values.push(Value::Integer(i64::from(limit)));
        bind_values.push(Value::Integer(i64::from(skip)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(parse_row::<E>(row)?);
        }
        Ok(entities)
    }

    pub fn count(&self) -> RepoResult<u64> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {};", E::TABLE), [], |row| {
                    row.get(0)
                })?;
        Ok(count.unsigned_abs())
    }

    fn reload(&self, id: &str) -> RepoResult<E> {
        self.find(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("{} `{id}` missing after write", E::ENTITY_NAME))
        })
    }

    fn in_transaction(
        &self,
        event: &str,
        id: &str,
        work: impl FnOnce(&Transaction<'_>) -> RepoResult<()>,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Err(err) = work(&tx) {
            error!(
                "event={event} module=repo status=error entity={} id={id} action=rollback error={err}",
                E::ENTITY_NAME
            );
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event={event} module=repo status=error entity={} id={id} action=rollback_failed error={rollback_err}",
                    E::ENTITY_NAME
                );
            }
            return Err(err);
        }

        if let Err(err) = tx.commit() {
            error!(
                "event={event} module=repo status=error entity={} id={id} action=commit error={err}",
                E::ENTITY_NAME
            );
            return Err(err.into());
        }

        debug!(
            "event={event} module=repo status=ok entity={} id={id}",
            E::ENTITY_NAME
        );
        Ok(())
    }
}

fn select_sql<E: SqlEntity>() -> String {
    format!(
        "SELECT {}, {} FROM {}",
        AUDIT_COLUMNS.join(", "),
        E::COLUMNS.join(", "),
        E::TABLE
    )
}

fn audit_values(audit: &AuditFields) -> Vec<Value> {
    vec![
        text(&audit.id),
        Value::Text(encode_dt(audit.created_at)),
        text_opt(audit.created_by.as_deref()),
        Value::Text(encode_dt(audit.updated_at)),
        encode_dt_opt(audit.deleted_at),
        text_opt(audit.deleted_by.as_deref()),
    ]
}

fn insert_row<E: SqlEntity>(tx: &Transaction<'_>, entity: &E) -> RepoResult<()> {
    let columns: Vec<&str> = AUDIT_COLUMNS.iter().chain(E::COLUMNS).copied().collect();
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders});",
        E::TABLE,
        columns.join(", ")
    );

    let mut values = audit_values(entity.audit());
    values.extend(entity.to_columns());
    tx.execute(&sql, params_from_iter(values))?;
    Ok(())
}

fn update_row<E: SqlEntity>(tx: &Transaction<'_>, entity: &E) -> RepoResult<()> {
    // `id` is the last bind parameter; every other column is rewritten.
    let columns: Vec<&str> = AUDIT_COLUMNS[1..].iter().chain(E::COLUMNS).copied().collect();
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {assignments} WHERE id = ?{};",
        E::TABLE,
        columns.len() + 1
    );

    let audit = entity.audit();
    let mut values = audit_values(audit).split_off(1);
    values.extend(entity.to_columns());
    values.push(text(&audit.id));

    let changed = tx.execute(&sql, params_from_iter(values))?;
    if changed == 0 {
        return Err(RepoError::InvalidData(format!(
            "{} `{}` vanished during update",
            E::ENTITY_NAME,
            audit.id
        )));
    }
    Ok(())
}

fn parse_row<E: SqlEntity>(row: &Row<'_>) -> RepoResult<E> {
    let audit = AuditFields {
        id: row.get("id")?,
        created_at: decode_dt(
            "created_at",
            &row.get::<_, String>("created_at")?,
        )?,
        created_by: row.get("created_by")?,
        updated_at: decode_dt(
            "updated_at",
            &row.get::<_, String>("updated_at")?,
        )?,
        deleted_at: decode_dt_opt("deleted_at", row.get("deleted_at")?)?,
        deleted_by: row.get("deleted_by")?,
    };
    E::from_columns(audit, row)
}

fn ensure_connection_ready<E: SqlEntity>(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, E::TABLE)? {
        return Err(RepoError::MissingRequiredTable(E::TABLE));
    }

    for &column in AUDIT_COLUMNS.iter().chain(E::COLUMNS) {
        if !table_has_column(conn, E::TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: E::TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
