//! Declarative table descriptors and `CREATE TABLE` rendering
//!
//! Descriptors are built by the caller and passed in; the library does not
//! persist or cache them. Foreign keys, indices, defaults, and composite
//! primary keys are out of scope.

use std::fmt;

/// SQL storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Real,
}

impl ColumnType {
    /// SQL keyword for this type
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
            ColumnType::Real => "REAL",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One column of a table descriptor. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    primary_key: bool,
    not_null: bool,
}

impl Column {
    /// A nullable, non-key column of the given type.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            not_null: false,
        }
    }

    /// Mark this column as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark this column as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null
    }

    /// Render this column's fragment of a `CREATE TABLE` statement.
    fn render(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.column_type.as_sql());
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

/// A table descriptor: name plus ordered columns. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column. Builder-style; output order follows append order.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column_named(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Render a `CREATE TABLE` statement for the descriptor.
///
/// `allow_preexisting` emits the `IF NOT EXISTS` guard; without it, creating
/// a table that already exists fails at execution time and the error is
/// surfaced, not swallowed.
pub fn create_table_sql(table: &Table, allow_preexisting: bool) -> String {
    let guard = if allow_preexisting {
        "IF NOT EXISTS "
    } else {
        ""
    };
    let columns = table
        .columns
        .iter()
        .map(Column::render)
        .collect::<Vec<_>>()
        .join(", ");

    format!("CREATE TABLE {}{} ({});", guard, table.name, columns)
}
