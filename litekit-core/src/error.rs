//! Error types for litekit-core

use thiserror::Error;

/// Main error type for the litekit-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Opening or closing the underlying connection failed
    #[error("connection error: {0}")]
    Connection(#[source] rusqlite::Error),

    /// A statement failed to execute or parse; carries the offending SQL
    #[error("query failed: {sql}: {source}")]
    Query {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// An operation required an active handle but none could be established
    #[error("no open database connection")]
    NoConnection,

    /// Entity/descriptor validation error
    #[error("schema error: {0}")]
    Schema(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for litekit-core
pub type Result<T> = std::result::Result<T, Error>;
