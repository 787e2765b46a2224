use rusqlite::Connection;
use taskremind_core::db::migrations::{apply_migrations, latest_version};
use taskremind_core::db::{open_db, open_db_in_memory, DbError};
use taskremind_core::{SqliteTaskRepository, TaskPriority, TaskRepository};
use uuid::Uuid;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "tasks");
    assert_table_exists(&conn, "reminder_deliveries");
    assert_table_exists(&conn, "settings");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskremind.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "reminder_deliveries");
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
fn delivery_kind_column_rejects_unknown_values() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO reminder_deliveries (task_uuid, kind, delivered_at) VALUES ('x', 'snooze', 0);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn task_columns_reject_unknown_status_and_priority() {
    let conn = open_db_in_memory().unwrap();
    let bad_status = conn.execute(
        "INSERT INTO tasks (uuid, title, status) VALUES ('a', 'x', 'archived');",
        [],
    );
    assert!(bad_status.is_err());

    let bad_priority = conn.execute(
        "INSERT INTO tasks (uuid, title, priority) VALUES ('b', 'x', 'urgent');",
        [],
    );
    assert!(bad_priority.is_err());

    let defaults: (String, String, Option<i64>) = conn
        .query_row(
            "INSERT INTO tasks (uuid, title) VALUES ('c', 'x')
             RETURNING status, priority, finished_at;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(defaults, ("pending".to_string(), "medium".to_string(), None));
}

#[test]
fn expected_indexes_exist() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(
        index_columns(&conn, "idx_reminder_deliveries_task_kind"),
        vec!["task_uuid", "kind"]
    );
    assert_eq!(
        index_columns(&conn, "idx_reminder_deliveries_delivered_at"),
        vec!["delivered_at"]
    );
    assert_eq!(
        index_columns(&conn, "idx_tasks_status_deadline"),
        vec!["status", "deadline"]
    );
    assert_eq!(index_columns(&conn, "idx_tasks_created_at"), vec!["created_at"]);
    assert_eq!(index_columns(&conn, "idx_tasks_finished_at"), vec!["finished_at"]);
}

#[test]
fn task_table_has_detail_columns() {
    let conn = open_db_in_memory().unwrap();
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('tasks');").unwrap();
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    for expected in [
        "uuid",
        "title",
        "description",
        "priority",
        "status",
        "deadline",
        "created_at",
        "updated_at",
        "finished_at",
    ] {
        assert!(columns.iter().any(|column| column == expected), "missing {expected}");
    }
}

#[test]
fn upgrade_from_v3_keeps_existing_tasks_readable() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_tasks.sql"))
        .unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0002_reminder_deliveries.sql"))
        .unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0003_settings.sql"))
        .unwrap();
    conn.execute_batch(
        "INSERT INTO tasks (uuid, title, status, deadline)
         VALUES ('11111111-2222-4333-8444-555555555555', 'legacy task', 'pending', 1700000000000);",
    )
    .unwrap();
    conn.execute_batch("PRAGMA user_version = 3;").unwrap();

    apply_migrations(&mut conn).unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let task = SqliteTaskRepository::new(&conn)
        .get_task(id)
        .unwrap()
        .unwrap();
    assert_eq!(task.title, "legacy task");
    assert_eq!(task.priority, TaskPriority::Medium);
    assert_eq!(task.description, None);
    assert_eq!(task.finished_at, None);
}

fn index_columns(conn: &Connection, index_name: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno;")
        .unwrap();
    stmt.query_map([index_name], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
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
