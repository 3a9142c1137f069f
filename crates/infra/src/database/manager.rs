//! Database connection manager backed by an r2d2 SQLCipher pool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use roamly_domain::{ExportError, Result};
use rusqlite::params;
use tracing::info;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pooled connection type handed to the repositories.
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database manager that wraps an encrypted SQLite pool.
#[derive(Debug)]
pub struct DbManager {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size and SQLCipher key.
    ///
    /// # Errors
    /// Returns [`ExportError::Storage`] when the key is missing or the pool
    /// cannot be built.
    pub fn new<P: AsRef<Path>>(
        db_path: P,
        pool_size: u32,
        encryption_key: Option<&str>,
    ) -> Result<Self> {
        let key = encryption_key
            .map(ToOwned::to_owned)
            .ok_or_else(|| ExportError::Storage("database encryption key not provided".into()))?;

        let path = db_path.as_ref().to_path_buf();

        let manager = SqliteConnectionManager::file(&path).with_init(move |conn| {
            conn.pragma_update(None, "key", &key)?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            // journal_mode returns the resulting mode as a row.
            conn.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(|err| ExportError::Storage(format!("failed to build pool: {err}")))?;

        info!(
            db_path = %path.display(),
            max_connections = pool.max_size(),
            "credential store pool initialised"
        );

        Ok(Self { pool, path })
    }

    /// Acquire a connection from the pool.
    ///
    /// # Errors
    /// Returns [`ExportError::Storage`] when the pool is exhausted.
    pub fn get_connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .map_err(|err| ExportError::Storage(format!("failed to acquire connection: {err}")))
    }

    /// Ensure the full schema exists on the current database.
    ///
    /// # Errors
    /// Returns [`ExportError::Storage`] on SQL failure.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at)
             VALUES (?1, CAST(strftime('%s','now') AS INTEGER))",
            params![SCHEMA_VERSION],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify database connectivity with a trivial query.
    ///
    /// # Errors
    /// Returns [`ExportError::Storage`] when the database is unreachable.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))
            .map_err(map_sql_error)?;
        Ok(())
    }
}

/// Map a rusqlite error into the domain storage error.
pub(crate) fn map_sql_error(err: rusqlite::Error) -> ExportError {
    ExportError::Storage(err.to_string())
}

/// Map a `spawn_blocking` join error into the domain storage error.
pub(crate) fn map_join_error(err: tokio::task::JoinError) -> ExportError {
    if err.is_cancelled() {
        ExportError::Storage("blocking task cancelled".into())
    } else {
        ExportError::Storage(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const TEST_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    #[test]
    fn migrations_create_schema_version() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4, Some(TEST_KEY)).expect("manager created");
        manager.run_migrations().expect("migrations run");

        let conn = manager.get_connection().expect("connection acquired");
        let version: i32 = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", params![], |row| row.get(0))
            .expect("query succeeded");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn migrations_are_idempotent() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4, Some(TEST_KEY)).expect("manager created");
        manager.run_migrations().expect("first run");
        manager.run_migrations().expect("second run");

        manager.health_check().expect("healthy");
    }

    #[test]
    fn missing_encryption_key_is_rejected() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");

        let err = DbManager::new(&db_path, 4, None).expect_err("must fail");
        assert!(matches!(err, ExportError::Storage(_)));
    }
}
