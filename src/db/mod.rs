//! Database module for SQLite-backed watch list and pair-state snapshots

use rusqlite::{Connection, Result as SqlResult};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub mod pair_state;
pub mod watch_list;

/// Database manager sharing one connection
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and run migrations
    pub fn open<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                // Surfaces as a SQLite open error if this fails.
                let _ = std::fs::create_dir_all(parent);
            }
        }

        let db = Self::from_connection(Connection::open(path)?);
        db.run_migrations()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> SqlResult<Self> {
        let db = Self::from_connection(Connection::open_in_memory()?);
        db.run_migrations()?;
        Ok(db)
    }

    fn from_connection(conn: Connection) -> Self {
        Database {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run migrations to set up or update the schema
    pub fn run_migrations(&self) -> SqlResult<()> {
        let migration_sql = include_str!("migrations/V1__initial_schema.sql");
        self.connection().execute_batch(migration_sql)
    }

    pub(crate) fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check database health
    pub fn health_check(&self) -> SqlResult<bool> {
        let result: i32 = self.connection().query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(result == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let db = Database::new_in_memory().unwrap();
        assert!(db.health_check().unwrap());
    }

    #[test]
    fn test_migrations_create_tables() {
        let db = Database::new_in_memory().unwrap();
        // Idempotent
        db.run_migrations().unwrap();

        let count: i32 = db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('watch_list', 'pair_state')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count, 2);
    }
}
