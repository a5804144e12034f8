//! SQLite index database.
//!
//! The node store holds the authoritative ledger bytes; this database is
//! the relational index over them (one row per validated ledger, one per
//! transaction, and one per (account, transaction) pairing) so clients can
//! query history without walking maps.

mod error;
mod pool;
pub mod queries;
mod schema;

pub use error::DbError;
pub use pool::{Database, PooledConnection};
pub use queries::ledger::{LedgerQueries, LedgerRow};
pub use queries::tx::{AccountTxRow, TxQueries, TxRow};
pub use schema::CREATE_SCHEMA;

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;
