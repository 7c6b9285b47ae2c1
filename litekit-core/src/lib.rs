//! # litekit-core
//!
//! Core library for litekit - a session-scoped convenience layer over an
//! embedded SQLite database.
//!
//! This library provides:
//! - Connection lifecycle management (explicit sessions or per-call
//!   implicit ones)
//! - Raw SQL execution with positional parameter binding
//! - Table creation from declarative descriptors
//! - Parameterized entity insertion
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use litekit_core::{params, Column, ColumnType, Database, Entity, Table};
//!
//! # fn main() -> litekit_core::Result<()> {
//! let mut db = Database::new("data.db");
//!
//! let users = Table::new("users")
//!     .column(Column::new("id", ColumnType::Integer).primary_key())
//!     .column(Column::new("name", ColumnType::Text).not_null());
//!
//! // One-off calls open and close their own connection
//! db.create_table(&users, true)?;
//!
//! // A session holds one connection across several operations
//! db.session(|db| {
//!     db.insert(&Entity::new("users").set("id", 1).set("name", "alice"))?;
//!     db.all("SELECT * FROM users WHERE name = ?1", params!["alice"])
//! })?;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::{Column, ColumnType, Database, RunResult, Table};
pub use error::{Error, Result};
pub use types::{Entity, Row, Value};

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
