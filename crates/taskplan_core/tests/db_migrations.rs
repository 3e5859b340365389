use rusqlite::Connection;
use taskplan_core::db::migrations::latest_version;
use taskplan_core::db::{open_db, open_db_in_memory, DbError, DB_FILE_NAME};
use taskplan_core::{RepoError, SqliteTaskStore};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "task_lists");
    assert_table_exists(&conn, "tasks");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DB_FILE_NAME);

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let default_lists: i64 = conn_second
        .query_row(
            "SELECT COUNT(*) FROM task_lists WHERE name = 'tasks';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(default_lists, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew {
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
fn store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteTaskStore::try_new(conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::Db(DbError::SchemaNotMigrated { db_version: 0, .. })
    ));
}

#[test]
fn schema_rejects_zero_priority_and_dangling_list() {
    let conn = open_db_in_memory().unwrap();

    let zero = conn.execute(
        "INSERT INTO task_lists (name, priority) VALUES ('zero', 0);",
        [],
    );
    assert!(zero.is_err());

    let dangling = conn.execute(
        "INSERT INTO tasks (id, description, due_date, due_time, list_name)
         VALUES (0, 'x', '2025-01-01', '10:00', 'missing');",
        [],
    );
    assert!(dangling.is_err());
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
