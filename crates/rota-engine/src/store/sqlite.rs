use std::path::Path;

use rusqlite::{Connection, Result, Transaction, TransactionBehavior};
use tracing::debug;

/// Handle to the relational store. Constructed once at process start and
/// passed by reference to every component that needs it.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.configure_pragmas()?;
        db.migrate_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.configure_pragmas()?;
        db.migrate_schema()?;
        Ok(db)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("SQLite pragmas configured (WAL mode, 5s busy timeout)");
        Ok(())
    }

    fn migrate_schema(&self) -> Result<()> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        debug!("SQLite schema initialized (version 1)");
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Deferred transaction for consistent multi-statement reads.
    pub(crate) fn begin_read(&self) -> Result<Transaction<'_>> {
        self.conn.unchecked_transaction()
    }

    /// `BEGIN IMMEDIATE`: takes the write lock up front so concurrent writers
    /// serialize. Dropping the transaction without committing rolls back.
    pub(crate) fn begin_write(&self) -> Result<Transaction<'_>> {
        Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
    }
}
