//! Connection lifecycle management
//!
//! [`Database`] owns at most one handle to the underlying database file and
//! moves between two states, Closed and Open. Callers either hold a session
//! open across several operations (`begin_session`/`end_session`, or the
//! scoped [`Database::session`]) or issue one-off calls, each of which opens
//! and closes its own implicit connection.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, error};

use crate::config::Config;
use crate::db::schema::{self, Table};
use crate::error::{Error, Result};
use crate::types::{Entity, Row, Value};

/// Execution metadata returned by mutating statements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    /// Rows changed by the statement
    pub rows_changed: usize,
    /// rowid of the most recent successful INSERT on this connection
    pub last_insert_rowid: i64,
}

/// Connection lifecycle manager for one embedded database file.
///
/// Exclusive ownership of the handle; `&mut self` methods serialize access
/// at compile time. Sessions do not nest: `begin_session` inside an open
/// session reuses the handle, and the first `end_session` closes it.
pub struct Database {
    path: PathBuf,
    conn: Option<Connection>,
}

impl Database {
    /// A manager for the database file at `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    /// A manager for the configured database path.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.database_path())
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a connection handle is currently held open.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the connection if none is open. A second call without an
    /// intervening [`end_session`](Self::end_session) reuses the handle.
    pub fn begin_session(&mut self) -> Result<()> {
        if self.conn.is_some() {
            debug!("session already open, reusing connection");
            return Ok(());
        }
        self.open()
    }

    /// Close the connection if one is open. Idempotent; the handle is
    /// cleared even when the close itself fails.
    pub fn end_session(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| {
                error!(error = %e, "failed to close connection");
                Error::Connection(e)
            })?;
            debug!("connection closed");
        }
        Ok(())
    }

    /// Run `block` inside a session: open, invoke, close — in that order,
    /// whether `block` returns `Ok` or `Err`.
    ///
    /// The closure completes before the session ends, so no work can
    /// outlive the connection. A `block` error takes precedence over a
    /// close error.
    pub fn session<T, F>(&mut self, block: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.begin_session()?;
        let result = block(self);
        let closed = self.end_session();
        match result {
            Ok(value) => closed.map(|_| value),
            Err(e) => {
                if let Err(close_err) = closed {
                    error!(error = %close_err, "failed to close connection after session error");
                }
                Err(e)
            }
        }
    }

    /// Execute one or more statements with no return value.
    ///
    /// Outside a session this opens an implicit connection and closes it
    /// again afterwards, even when a statement fails.
    pub fn exec(&mut self, sql: &str) -> Result<()> {
        self.with_connection(|conn| conn.execute_batch(sql).map_err(|e| query_error(sql, e)))
    }

    /// Execute one mutating statement with positional parameters and return
    /// execution metadata. Same auto-session policy as [`exec`](Self::exec).
    pub fn run(&mut self, sql: &str, args: &[Value]) -> Result<RunResult> {
        self.with_connection(|conn| {
            let rows_changed = conn
                .execute(sql, rusqlite::params_from_iter(args.iter()))
                .map_err(|e| query_error(sql, e))?;
            Ok(RunResult {
                rows_changed,
                last_insert_rowid: conn.last_insert_rowid(),
            })
        })
    }

    /// Query at most one row. `Ok(None)` when nothing matches.
    pub fn get(&mut self, sql: &str, args: &[Value]) -> Result<Option<Row>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(sql).map_err(|e| query_error(sql, e))?;
            let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
            let mut rows = stmt
                .query(rusqlite::params_from_iter(args.iter()))
                .map_err(|e| query_error(sql, e))?;

            match rows.next().map_err(|e| query_error(sql, e))? {
                Some(row) => Ok(Some(materialize(&columns, row).map_err(|e| query_error(sql, e))?)),
                None => Ok(None),
            }
        })
    }

    /// Query every matching row, in statement order.
    pub fn all(&mut self, sql: &str, args: &[Value]) -> Result<Vec<Row>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(sql).map_err(|e| query_error(sql, e))?;
            let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
            let mut rows = stmt
                .query(rusqlite::params_from_iter(args.iter()))
                .map_err(|e| query_error(sql, e))?;

            let mut out = Vec::new();
            while let Some(row) = rows.next().map_err(|e| query_error(sql, e))? {
                out.push(materialize(&columns, row).map_err(|e| query_error(sql, e))?);
            }
            Ok(out)
        })
    }

    /// Create a table from a descriptor.
    ///
    /// `allow_preexisting` emits `IF NOT EXISTS`; without it, creating an
    /// existing table fails with [`Error::Query`].
    pub fn create_table(&mut self, table: &Table, allow_preexisting: bool) -> Result<()> {
        let sql = schema::create_table_sql(table, allow_preexisting);
        self.exec(&sql)
    }

    /// Insert an entity: synthesize a parameterized `INSERT` from its
    /// ordered `(column, value)` pairs and run it.
    pub fn insert(&mut self, entity: &Entity) -> Result<RunResult> {
        let sql = insert_sql(entity)?;
        let args: Vec<Value> = entity.columns().iter().map(|(_, v)| v.clone()).collect();
        self.run(&sql, &args)
    }

    /// Like [`insert`](Self::insert) but validates the entity against the
    /// table descriptor before building the statement.
    pub fn insert_checked(&mut self, table: &Table, entity: &Entity) -> Result<RunResult> {
        entity.validate(table)?;
        self.insert(entity)
    }

    fn open(&mut self) -> Result<()> {
        // A bare file name has an empty parent
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&self.path).map_err(Error::Connection)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )
        .map_err(Error::Connection)?;

        debug!(path = %self.path.display(), "connection opened");
        self.conn = Some(conn);
        Ok(())
    }

    /// Run `op` with the active connection, opening an implicit one when no
    /// session is active. An implicit connection is closed again on every
    /// exit path, including when `op` fails.
    fn with_connection<T>(&mut self, op: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let implicit = self.conn.is_none();
        if implicit {
            self.open()?;
        }

        let result = match self.conn.as_ref() {
            Some(conn) => op(conn),
            None => Err(Error::NoConnection),
        };

        if implicit {
            let closed = self.end_session();
            return match result {
                Ok(value) => closed.map(|_| value),
                Err(e) => {
                    if let Err(close_err) = closed {
                        error!(error = %close_err, "failed to close implicit connection");
                    }
                    Err(e)
                }
            };
        }
        result
    }
}

fn query_error(sql: &str, source: rusqlite::Error) -> Error {
    error!(sql, error = %source, "statement failed");
    Error::Query {
        sql: sql.to_string(),
        source,
    }
}

fn materialize(columns: &[String], row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    let mut cells = Vec::with_capacity(columns.len());
    for (i, name) in columns.iter().enumerate() {
        cells.push((name.clone(), Value::from(row.get_ref(i)?)));
    }
    Ok(Row::new(cells))
}

fn insert_sql(entity: &Entity) -> Result<String> {
    if entity.columns().is_empty() {
        return Err(Error::Schema(format!(
            "entity for table '{}' has no column values",
            entity.table()
        )));
    }

    let names = entity
        .columns()
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=entity.columns().len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        entity.table(),
        names,
        placeholders
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("test.db"));
        (dir, db)
    }

    #[test]
    fn test_state_machine() {
        let (_dir, mut db) = temp_db();
        assert!(!db.is_open());

        db.begin_session().unwrap();
        assert!(db.is_open());

        // Second begin is a no-op, not a second handle
        db.begin_session().unwrap();
        assert!(db.is_open());

        db.end_session().unwrap();
        assert!(!db.is_open());

        // end when already closed is a no-op
        db.end_session().unwrap();
        assert!(!db.is_open());
    }

    #[test]
    fn test_open_failure_is_connection_error() {
        let (dir, _) = temp_db();
        // A directory cannot be opened as a database file
        let mut db = Database::new(dir.path());
        assert!(matches!(db.begin_session(), Err(Error::Connection(_))));
        assert!(!db.is_open());
    }

    #[test]
    fn test_insert_sql_shape() {
        let entity = Entity::new("t").set("foo", 1).set("bar", "x");
        let sql = insert_sql(&entity).unwrap();
        assert_eq!(sql, "INSERT INTO t (foo, bar) VALUES (?1, ?2)");
    }

    #[test]
    fn test_insert_empty_entity() {
        let entity = Entity::new("t");
        assert!(matches!(insert_sql(&entity), Err(Error::Schema(_))));
    }
}
