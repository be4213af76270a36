//! Database connection manager backed by the SQLCipher pool.

use std::path::{Path, PathBuf};

use chrono::Utc;
use pslang_domain::{PsLangError, Result};
use rusqlite::params;
use tracing::info;

use super::sqlcipher_pool::{
    create_sqlcipher_pool, SqlCipherConnection, SqlCipherPool, SqlCipherPoolConfig,
};
use super::map_sql_error;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlCipherPool`].
pub struct DbManager {
    pool: SqlCipherPool,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size and SQLCipher key.
    pub fn new<P: AsRef<Path>>(
        db_path: P,
        pool_size: u32,
        encryption_key: Option<&str>,
    ) -> Result<Self> {
        let key = encryption_key
            .filter(|k| !k.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| PsLangError::Config("database encryption key not provided".into()))?;

        let path = db_path.as_ref().to_path_buf();
        let config =
            SqlCipherPoolConfig { max_size: pool_size.max(1), ..SqlCipherPoolConfig::default() };
        let pool = create_sqlcipher_pool(&path, key, config)?;

        info!(db_path = %path.display(), max_connections = pool.max_size(), "sqlcipher pool initialised");

        Ok(Self { pool, path })
    }

    /// Borrow the underlying pool.
    pub fn pool(&self) -> &SqlCipherPool {
        &self.pool
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<SqlCipherConnection> {
        self.pool.get().map_err(|e| PsLangError::Database(format!("connection unavailable: {e}")))
    }

    /// Ensure the full schema exists on the current database. Idempotent.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            params![SCHEMA_VERSION, Utc::now().timestamp_millis()],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify the database is reachable and answering queries.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0)).map_err(map_sql_error)?;
        Ok(())
    }
}
