//! Database error types.

use thiserror::Error;

/// Errors from the index database.
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Stored data failed validation on the way out.
    #[error("integrity error: {0}")]
    Integrity(String),
}
