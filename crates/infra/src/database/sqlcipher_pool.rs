//! SQLCipher pool helpers
//!
//! Builds an r2d2 pool of encrypted SQLite connections. Every connection gets
//! the encryption key first, then the concurrency pragmas.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use pslang_domain::{PsLangError, Result as DomainResult};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, info, warn};

/// Pool of encrypted connections.
pub type SqlCipherPool = Pool<SqliteConnectionManager>;

/// Connection checked out of a [`SqlCipherPool`].
pub type SqlCipherConnection = PooledConnection<SqliteConnectionManager>;

/// Pool sizing and timeouts.
#[derive(Debug, Clone)]
pub struct SqlCipherPoolConfig {
    pub max_size: u32,
    pub connection_timeout: Duration,
    pub busy_timeout: Duration,
}

impl Default for SqlCipherPoolConfig {
    fn default() -> Self {
        Self {
            max_size: 8,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
struct CipherKey(String);

// Custom Debug impl to avoid exposing the key
impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey(***)")
    }
}

/// Open (or create) the encrypted database at `path` and return a pool.
///
/// A test connection is checked out immediately so a wrong key fails here
/// instead of on the first request.
///
/// # Errors
/// `Config` when the key does not open the file, `Database` for any other
/// pool failure.
pub fn create_sqlcipher_pool<P: AsRef<Path>>(
    path: P,
    encryption_key: String,
    config: SqlCipherPoolConfig,
) -> DomainResult<SqlCipherPool> {
    let key = CipherKey(encryption_key);
    let busy_timeout = config.busy_timeout;

    let manager = SqliteConnectionManager::file(path.as_ref()).with_init(move |conn| {
        configure_sqlcipher(conn, &key)?;
        apply_connection_pragmas(conn, busy_timeout)
    });

    let pool = Pool::builder()
        .max_size(config.max_size.max(1))
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .map_err(|e| map_pool_error("failed to create pool", &e))?;

    {
        let conn = pool.get().map_err(|e| map_pool_error("failed to get test connection", &e))?;
        verify_encryption(&conn)?;
        debug!("encryption verified");
    }

    info!(max_size = config.max_size, "sqlcipher pool created");
    Ok(pool)
}

fn configure_sqlcipher(conn: &Connection, key: &CipherKey) -> rusqlite::Result<()> {
    // The key must be the first statement on a fresh connection.
    conn.pragma_update(None, "key", &key.0)?;
    conn.pragma_update(None, "cipher_compatibility", 4)?;
    conn.pragma_update(None, "cipher_memory_security", "ON")?;
    Ok(())
}

fn apply_connection_pragmas(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA wal_autocheckpoint=1000;
         PRAGMA synchronous=NORMAL;
         PRAGMA foreign_keys=ON;",
    )?;
    conn.busy_timeout(busy_timeout)
}

/// Reading `sqlite_master` forces page decryption.
fn verify_encryption(conn: &Connection) -> DomainResult<()> {
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
        .map(|_| ())
        .map_err(|e| {
            warn!(error = %e, "encryption verification failed");
            if looks_like_wrong_key(&e.to_string()) {
                wrong_key()
            } else {
                PsLangError::Database(format!("failed to verify database: {e}"))
            }
        })
}

fn map_pool_error(context: &str, err: &r2d2::Error) -> PsLangError {
    warn!(error = %err, "{context}");
    if looks_like_wrong_key(&err.to_string()) {
        wrong_key()
    } else {
        PsLangError::Database(format!("{context}: {err}"))
    }
}

pub(crate) fn looks_like_wrong_key(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("file is not a database")
        || lower.contains("file is encrypted")
        || lower.contains("database disk image is malformed")
        || lower.contains("notadb")
}

pub(crate) fn wrong_key() -> PsLangError {
    PsLangError::Config("SQLCipher key rejected or database not encrypted".into())
}
