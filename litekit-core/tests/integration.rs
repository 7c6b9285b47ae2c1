//! Integration tests for the litekit database layer
//!
//! These tests run against temporary on-disk databases to exercise the full
//! connection lifecycle: explicit sessions, implicit per-call connections,
//! schema translation, and entity insertion.

use litekit_core::{params, Column, ColumnType, Database, Entity, Error, Row, Table, Value};
use tempfile::TempDir;

/// Create a manager for a fresh database file in a temp directory
fn test_db(dir: &TempDir) -> Database {
    Database::new(dir.path().join("test.db"))
}

/// Descriptor used by most tests: t (foo INTEGER, bar TEXT)
fn t_table() -> Table {
    Table::new("t")
        .column(Column::new("foo", ColumnType::Integer))
        .column(Column::new("bar", ColumnType::Text))
}

// ============================================
// Connection lifecycle
// ============================================

#[test]
fn test_implicit_calls_leave_connection_closed() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);

    assert!(!db.is_open());
    db.create_table(&t_table(), true).unwrap();
    assert!(!db.is_open());

    db.exec("INSERT INTO t (foo, bar) VALUES (1, 'a')").unwrap();
    assert!(!db.is_open());

    db.run(
        "INSERT INTO t (foo, bar) VALUES (?1, ?2)",
        params![2, "b"],
    )
    .unwrap();
    assert!(!db.is_open());

    db.get("SELECT * FROM t WHERE foo = ?1", params![1]).unwrap();
    assert!(!db.is_open());

    db.all("SELECT * FROM t", params![]).unwrap();
    assert!(!db.is_open());
}

#[test]
fn test_failing_implicit_call_still_closes() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);

    let result = db.exec("INSERT INTO does_not_exist VALUES (1)");
    assert!(matches!(result, Err(Error::Query { .. })));
    assert!(!db.is_open());

    let result = db.all("SELECT * FROM does_not_exist", params![]);
    assert!(result.is_err());
    assert!(!db.is_open());
}

#[test]
fn test_data_persists_across_implicit_calls() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);

    db.create_table(&t_table(), true).unwrap();
    db.run(
        "INSERT INTO t (foo, bar) VALUES (?1, ?2)",
        params![7, "kept"],
    )
    .unwrap();

    // Each call opened and closed its own connection; the file kept the data
    let rows = db.all("SELECT * FROM t", params![]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("bar"), Some(&Value::Text("kept".to_string())));
}

#[test]
fn test_session_reuses_one_connection() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);
    db.create_table(&t_table(), true).unwrap();

    db.session(|db| {
        assert!(db.is_open());
        db.exec("INSERT INTO t (foo, bar) VALUES (1, 'a')")?;
        // Still open between operations inside the session
        assert!(db.is_open());
        db.run(
            "INSERT INTO t (foo, bar) VALUES (?1, ?2)",
            params![2, "b"],
        )?;
        assert!(db.is_open());
        Ok(())
    })
    .unwrap();

    assert!(!db.is_open());
    let rows = db.all("SELECT * FROM t ORDER BY foo", params![]).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_session_closes_on_block_error() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);
    db.create_table(&t_table(), true).unwrap();

    let result: litekit_core::Result<()> = db.session(|db| {
        db.exec("INSERT INTO t (foo, bar) VALUES (1, 'a')")?;
        Err(Error::Schema("deliberate failure".to_string()))
    });

    assert!(matches!(result, Err(Error::Schema(_))));
    assert!(!db.is_open());
}

#[test]
fn test_double_begin_session_is_noop() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);

    db.begin_session().unwrap();
    db.begin_session().unwrap();
    assert!(db.is_open());

    // One end closes the single handle
    db.end_session().unwrap();
    assert!(!db.is_open());

    // Already closed: no-op
    db.end_session().unwrap();
}

// ============================================
// Schema translation
// ============================================

#[test]
fn test_create_table_allow_preexisting_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);

    db.create_table(&t_table(), true).unwrap();
    db.create_table(&t_table(), true).unwrap();
}

#[test]
fn test_create_table_collision_fails_with_query_error() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);

    db.create_table(&t_table(), false).unwrap();
    let result = db.create_table(&t_table(), false);

    match result {
        Err(Error::Query { sql, .. }) => {
            assert!(sql.contains("CREATE TABLE t"));
        }
        other => panic!("expected Error::Query, got {:?}", other.err()),
    }
    assert!(!db.is_open());
}

#[test]
fn test_create_table_with_constraints() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);

    let users = Table::new("users")
        .column(Column::new("id", ColumnType::Integer).primary_key())
        .column(Column::new("name", ColumnType::Text).not_null())
        .column(Column::new("score", ColumnType::Real));
    db.create_table(&users, false).unwrap();

    // NOT NULL constraint is live
    let result = db.run("INSERT INTO users (id) VALUES (?1)", params![1]);
    assert!(matches!(result, Err(Error::Query { .. })));

    db.run(
        "INSERT INTO users (id, name, score) VALUES (?1, ?2, ?3)",
        params![1, "alice", 0.5],
    )
    .unwrap();
}

// ============================================
// Entity insertion and queries
// ============================================

#[test]
fn test_insert_select_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);
    db.create_table(&t_table(), true).unwrap();

    let entity = Entity::new("t").set("foo", 1337).set("bar", "potato");
    let result = db.insert(&entity).unwrap();
    assert_eq!(result.rows_changed, 1);

    let rows = db.all("SELECT * FROM t", params![]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("foo"), Some(&Value::Integer(1337)));
    assert_eq!(rows[0].get("bar"), Some(&Value::Text("potato".to_string())));
    assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["foo", "bar"]);
}

#[test]
fn test_run_returns_execution_metadata() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);

    let users = Table::new("users")
        .column(Column::new("id", ColumnType::Integer).primary_key())
        .column(Column::new("name", ColumnType::Text));
    db.create_table(&users, true).unwrap();

    db.session(|db| {
        let r = db.run(
            "INSERT INTO users (name) VALUES (?1)",
            params!["alice"],
        )?;
        assert_eq!(r.rows_changed, 1);
        assert_eq!(r.last_insert_rowid, 1);

        let r = db.run(
            "UPDATE users SET name = ?1 WHERE id = ?2",
            params!["bob", 1],
        )?;
        assert_eq!(r.rows_changed, 1);
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_get_returns_none_for_no_match() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);
    db.create_table(&t_table(), true).unwrap();

    let row = db
        .get("SELECT * FROM t WHERE foo = ?1", params![99])
        .unwrap();
    assert!(row.is_none());
}

#[test]
fn test_get_returns_first_row() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);
    db.create_table(&t_table(), true).unwrap();
    db.exec("INSERT INTO t (foo, bar) VALUES (1, 'a'), (2, 'b')")
        .unwrap();

    let row = db
        .get("SELECT * FROM t ORDER BY foo", params![])
        .unwrap()
        .expect("row expected");
    assert_eq!(row.get("foo"), Some(&Value::Integer(1)));
}

#[test]
fn test_quote_in_argument_does_not_inject() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);
    db.create_table(&t_table(), true).unwrap();

    let tricky = "po'tato'); DROP TABLE t; --";
    db.run(
        "INSERT INTO t (foo, bar) VALUES (?1, ?2)",
        params![1, tricky],
    )
    .unwrap();

    // The value round-trips verbatim and the table survived
    let row = db
        .get("SELECT bar FROM t WHERE bar = ?1", params![tricky])
        .unwrap()
        .expect("row expected");
    assert_eq!(row.get("bar"), Some(&Value::Text(tricky.to_string())));

    let rows = db.all("SELECT * FROM t", params![]).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_null_values_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);
    db.create_table(&t_table(), true).unwrap();

    let entity = Entity::new("t").set("foo", 1).set("bar", None::<String>);
    db.insert(&entity).unwrap();

    let row = db
        .get("SELECT * FROM t WHERE foo = ?1", params![1])
        .unwrap()
        .expect("row expected");
    assert_eq!(row.get("bar"), Some(&Value::Null));
}

#[test]
fn test_insert_checked_validates_against_descriptor() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);
    let table = t_table();
    db.create_table(&table, true).unwrap();

    // Valid entity goes through
    let ok = Entity::new("t").set("foo", 1).set("bar", "x");
    db.insert_checked(&table, &ok).unwrap();

    // Unknown column is rejected before any SQL runs
    let unknown = Entity::new("t").set("baz", 1);
    assert!(matches!(
        db.insert_checked(&table, &unknown),
        Err(Error::Schema(_))
    ));

    // Type mismatch is rejected
    let mismatch = Entity::new("t").set("foo", "not an integer");
    assert!(matches!(
        db.insert_checked(&table, &mismatch),
        Err(Error::Schema(_))
    ));

    // Only the valid insert landed
    let rows = db.all("SELECT * FROM t", params![]).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_query_error_carries_sql_text() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);

    let sql = "SELECT * FROM nowhere";
    match db.all(sql, params![]) {
        Err(Error::Query { sql: reported, .. }) => assert_eq!(reported, sql),
        other => panic!("expected Error::Query, got {:?}", other.err()),
    }
}

#[test]
fn test_rows_are_owned_after_close() {
    let dir = TempDir::new().unwrap();
    let mut db = test_db(&dir);
    db.create_table(&t_table(), true).unwrap();
    db.exec("INSERT INTO t (foo, bar) VALUES (1, 'a')").unwrap();

    let rows: Vec<Row> = db
        .session(|db| db.all("SELECT * FROM t", params![]))
        .unwrap();

    // Session is over; the materialized rows remain usable
    assert!(!db.is_open());
    assert_eq!(rows[0].get("foo"), Some(&Value::Integer(1)));
}
