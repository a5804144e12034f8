//! Connection pool management.
//!
//! [`Database`] wraps an r2d2 SQLite pool. It is `Clone` and safe to share
//! across threads; each use takes a connection from the pool and returns it
//! on drop. Multi-statement writes go through [`Database::transaction`].

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::debug;

use crate::schema::CREATE_SCHEMA;
use crate::Result;

/// A pooled SQLite connection, returned to the pool when dropped.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Index database handle with connection pooling.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (creating if needed) a database file and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder().build(manager)?;
        let db = Self { pool };
        db.init_schema()?;
        debug!(path = %path.as_ref().display(), "index database open");
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// The pool is limited to one connection: each in-memory connection is
    /// its own database, so sharing requires a single handle.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch(CREATE_SCHEMA)?;
            Ok(())
        })
    }

    /// Obtain a connection from the pool.
    pub fn connection(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Run a closure with a pooled connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.connection()?;
        f(&conn)
    }

    /// Run a closure inside a transaction.
    ///
    /// Commits on `Ok`, rolls back on `Err`.
    pub fn transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                let _ = tx.rollback();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    #[test]
    fn schema_applies() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert!(count >= 3);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<()> = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO Transactions (TransID, LedgerSeq, Status) VALUES ('AB', 1, 'V')",
                [],
            )?;
            Err(DbError::Integrity("forced".into()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM Transactions", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn file_database_opens() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("index.db")).unwrap();
        db.with_connection(|conn| {
            conn.execute_batch("SELECT 1;")?;
            Ok(())
        })
        .unwrap();
    }
}
