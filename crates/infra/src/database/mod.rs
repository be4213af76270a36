//! SQLCipher-backed persistence
//!
//! Each repository implements one core port. SQL runs on the blocking pool
//! via [`with_connection`]; rows are mapped with the column helpers below.

pub mod account_repository;
pub mod conversation_repository;
pub mod credential_repository;
pub mod manager;
pub mod preference_repository;
pub mod sqlcipher_pool;

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pslang_domain::{PsLangError, Result};
use rusqlite::types::Type;
use serde::de::DeserializeOwned;
use tokio::task;

pub use account_repository::SqlCipherAccountRepository;
pub use conversation_repository::SqlCipherConversationRepository;
pub use credential_repository::SqlCipherCredentialRepository;
pub use manager::DbManager;
pub use preference_repository::SqlCipherPreferenceRepository;
pub use sqlcipher_pool::{SqlCipherConnection, SqlCipherPool, SqlCipherPoolConfig};

use crate::errors::InfraError;

/// Run `op` with a pooled connection on the blocking thread pool.
pub(crate) async fn with_connection<T, F>(db: &Arc<DbManager>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&SqlCipherConnection) -> Result<T> + Send + 'static,
{
    let db = Arc::clone(db);
    task::spawn_blocking(move || {
        let conn = db.get_connection()?;
        op(&conn)
    })
    .await
    .map_err(map_join_error)?
}

pub(crate) fn map_sql_error(err: rusqlite::Error) -> PsLangError {
    PsLangError::from(InfraError::from(err))
}

fn map_join_error(err: task::JoinError) -> PsLangError {
    if err.is_cancelled() {
        PsLangError::Internal("blocking database task cancelled".into())
    } else {
        PsLangError::Internal(format!("blocking database task failed: {err}"))
    }
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(idx: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

pub(crate) fn opt_from_millis(
    idx: usize,
    millis: Option<i64>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    millis.map(|m| from_millis(idx, m)).transpose()
}

/// Parse a TEXT column holding an enum's string form.
pub(crate) fn parse_column<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = PsLangError>,
{
    value
        .parse()
        .map_err(|e: PsLangError| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode a TEXT column holding JSON.
pub(crate) fn json_column<T: DeserializeOwned>(idx: usize, value: &str) -> rusqlite::Result<T> {
    serde_json::from_str(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
