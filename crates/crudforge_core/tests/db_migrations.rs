use crudforge_core::db::migrations::latest_version;
use crudforge_core::db::{open_db, open_db_in_memory, DbError, SessionFactory};
use crudforge_core::{default_registry, Entity, RepoError, Todo, TodoRepository};
use crudforge_core::repo::base_repo::Repository;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "todos");
    assert_table_exists(&conn, "users");
    assert_table_exists(&conn, "campaigns");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crudforge.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "todos");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn file_sessions_share_rows_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("shared.db").display());
    let factory = SessionFactory::from_url(&url).unwrap();
    let registry = default_registry().unwrap();

    let first = factory.open_session().unwrap();
    let saved = TodoRepository::try_new(&first, &registry)
        .unwrap()
        .save(registry.builder::<Todo>().with_attribute("title", "persist me").build().unwrap())
        .unwrap();
    drop(first);

    let second = factory.open_session().unwrap();
    let found = TodoRepository::try_new(&second, &registry)
        .unwrap()
        .find(saved.id())
        .unwrap()
        .unwrap();
    assert_eq!(found.title, "persist me");
}

#[test]
fn unsupported_urls_are_rejected() {
    assert!(matches!(
        SessionFactory::from_url("postgres://localhost/app"),
        Err(DbError::UnsupportedUrl(_))
    ));
    assert!(matches!(
        SessionFactory::from_url("   "),
        Err(DbError::UnsupportedUrl(_))
    ));
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let registry = default_registry().unwrap();

    let err = Repository::<Todo>::try_new(&conn, &registry).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn repository_rejects_table_missing_a_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE todos (
            id TEXT PRIMARY KEY, created_at TEXT, created_by TEXT,
            updated_at TEXT, deleted_at TEXT, deleted_by TEXT,
            title TEXT, description TEXT
        );
        PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();
    let registry = default_registry().unwrap();

    let err = Repository::<Todo>::try_new(&conn, &registry).err().unwrap();
    assert!(matches!(
        err,
        RepoError::MissingRequiredColumn {
            table: "todos",
            column: "completed"
        }
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
