//! Core value and record types for litekit-core
//!
//! Rows pass through the layer unchanged: a result cell is materialized into
//! a [`Value`] and handed back without interpretation.

use rusqlite::types::{ToSqlOutput, ValueRef};

use crate::db::schema::{ColumnType, Table};
use crate::error::{Error, Result};

/// A value that can be bound to a statement parameter or read from a result
/// column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Binary blob.
    Blob(Vec<u8>),
}

impl Value {
    /// Short type label used in validation messages.
    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
        }
    }

    /// Whether this value can be stored in a column of the given type.
    ///
    /// Follows SQLite affinity: `REAL` columns accept integers. `NULL` is
    /// handled by the nullability check, not here.
    fn compatible_with(&self, column_type: ColumnType) -> bool {
        matches!(
            (self, column_type),
            (Value::Integer(_), ColumnType::Integer)
                | (Value::Real(_), ColumnType::Real)
                | (Value::Integer(_), ColumnType::Real)
                | (Value::Text(_), ColumnType::Text)
        )
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Blob(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// Convenience macro for building positional parameter slices.
///
/// Usage: `db.run("INSERT INTO t (a, b) VALUES (?1, ?2)", params![1337, "potato"])`
#[macro_export]
macro_rules! params {
    () => {
        &[] as &[$crate::Value]
    };
    ($($val:expr),+ $(,)?) => {
        &[$($crate::Value::from($val)),+][..]
    };
}

/// One result row: ordered `(column name, value)` cells.
///
/// Owned, so it stays valid after the connection that produced it closes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub(crate) fn new(cells: Vec<(String, Value)>) -> Self {
        Self { cells }
    }

    /// Get a cell by column name. Returns the first match.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Get a cell by position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.cells.get(index).map(|(_, value)| value)
    }

    /// Column names in statement order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Consume the row into its `(column, value)` pairs.
    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.cells
    }
}

/// A record destined for insertion: a table name plus an explicit ordered
/// list of `(column, value)` pairs.
///
/// The column order of the synthesized `INSERT` is the order the pairs were
/// added in.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    table: String,
    columns: Vec<(String, Value)>,
}

impl Entity {
    /// Start an entity for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    /// Add a column value. Builder-style.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.push((column.into(), value.into()));
        self
    }

    /// Target table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The `(column, value)` pairs, in insertion order.
    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    /// Check this entity against a table descriptor.
    ///
    /// Verifies the table name matches, every column exists in the
    /// descriptor, each value is type-compatible with its column, and NULL
    /// is only supplied for nullable columns. Missing columns are not an
    /// error; the engine decides what an omitted column means.
    pub fn validate(&self, table: &Table) -> Result<()> {
        if self.table != table.name() {
            return Err(Error::Schema(format!(
                "entity targets table '{}' but descriptor is for '{}'",
                self.table,
                table.name()
            )));
        }

        for (name, value) in &self.columns {
            let column = table.column_named(name).ok_or_else(|| {
                Error::Schema(format!(
                    "entity column '{}' does not exist in table '{}'",
                    name, self.table
                ))
            })?;

            match value {
                Value::Null => {
                    if column.is_not_null() {
                        return Err(Error::Schema(format!(
                            "column '{}' is NOT NULL but entity supplies NULL",
                            name
                        )));
                    }
                }
                other => {
                    if !other.compatible_with(column.column_type()) {
                        return Err(Error::Schema(format!(
                            "column '{}' is {} but entity supplies {}",
                            name,
                            column.column_type().as_sql(),
                            other.type_name()
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
