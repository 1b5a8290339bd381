//! Common error types for the sake catalog tools

use thiserror::Error;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by every crate in the workspace
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding of a stored payload failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the underlying database reported a missing table
    ///
    /// Used to treat a store that was never bootstrapped as empty.
    pub fn is_missing_table(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                db_err.message().contains("no such table")
            }
            _ => false,
        }
    }
}
