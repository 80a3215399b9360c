//! Database manager implementation
//!
//! SQLite connection pool using r2d2, with an async wrapper that moves
//! blocking database work onto the tokio blocking pool.

use crate::core::error::{Result, ServiceError};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task;

/// Database manager with connection pool
pub struct DatabaseManager {
    pool: Pool<SqliteConnectionManager>,
    db_path: PathBuf,
}

impl DatabaseManager {
    /// Open (or create) the database file and run pending migrations
    pub fn new(db_path: &Path, pool_size: u32, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path)
            .with_init(move |conn| {
                conn.busy_timeout(busy_timeout)?;
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(Duration::from_secs(30))
            .build(manager)
            .map_err(|e| ServiceError::PoolError(e.to_string()))?;

        let manager = Self {
            pool,
            db_path: db_path.to_path_buf(),
        };

        manager.migrate()?;

        Ok(manager)
    }

    /// Create a new DatabaseManager with an in-memory database for testing
    pub fn new_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();

        // Every pooled connection to ":memory:" is a separate database
        let pool = Pool::builder()
            .max_size(1)
            .connection_timeout(Duration::from_secs(30))
            .build(manager)
            .map_err(|e| ServiceError::PoolError(e.to_string()))?;

        let manager = Self {
            pool,
            db_path: PathBuf::from(":memory:"),
        };

        manager.migrate()?;

        Ok(manager)
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| ServiceError::PoolError(e.to_string()))
    }

    /// Execute a database operation asynchronously
    ///
    /// The closure runs inside `spawn_blocking` with a pooled connection.
    pub async fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| ServiceError::PoolError(e.to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| ServiceError::TaskError(format!("Database task panicked: {}", e)))?
    }

    /// Execute database migrations
    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.get_connection()?;
        crate::db::migrations::run_migrations(&mut conn)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = DatabaseManager::new_in_memory().unwrap();

        let tables: i64 = db
            .execute(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
                    [],
                    |row| row.get(0),
                )
                .map_err(ServiceError::DatabaseError)
            })
            .await
            .unwrap();

        assert_eq!(tables, 1);
        assert_eq!(db.path(), Path::new(":memory:"));
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.db");

        let db = DatabaseManager::new(&path, 2, Duration::from_millis(500)).unwrap();
        assert!(path.exists());

        // Reopening runs migrations again without failing
        drop(db);
        assert!(DatabaseManager::new(&path, 2, Duration::from_millis(500)).is_ok());
    }

    #[tokio::test]
    async fn test_execute_propagates_closure_error() {
        let db = DatabaseManager::new_in_memory().unwrap();

        let result: Result<()> = db
            .execute(|_conn| Err(ServiceError::InvalidUserRecord("nope".into())))
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidUserRecord(_))));
    }
}
