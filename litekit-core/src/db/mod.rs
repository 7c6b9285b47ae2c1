//! Database layer for litekit
//!
//! This module provides the convenience layer over SQLite:
//! - Connection lifecycle management with explicit and implicit sessions
//! - Declarative table descriptors translated to `CREATE TABLE` statements

pub mod schema;
pub mod session;

pub use schema::{create_table_sql, Column, ColumnType, Table};
pub use session::{Database, RunResult};
