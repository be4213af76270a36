//! SQLCipher-backed connector credential repository.
//!
//! Keyed by `(user_id, provider)`; an upsert replaces tokens and status but
//! keeps the original `created_at`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pslang_core::CredentialRepository;
use pslang_domain::{ChatProvider, ConnectorCredential, ConnectorStatus, PsLangError, Result};
use rusqlite::{params, OptionalExtension, Row};

use super::manager::DbManager;
use super::{
    from_millis, map_sql_error, opt_from_millis, parse_column, to_millis, with_connection,
    SqlCipherConnection,
};

const SELECT_COLUMNS: &str = "SELECT user_id, provider, access_token, refresh_token, status,
        last_sync_at, created_at, updated_at
     FROM connector_credentials";

pub struct SqlCipherCredentialRepository {
    db: Arc<DbManager>,
}

impl SqlCipherCredentialRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialRepository for SqlCipherCredentialRepository {
    async fn get(
        &self,
        user_id: &str,
        provider: ChatProvider,
    ) -> Result<Option<ConnectorCredential>> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE user_id = ?1 AND provider = ?2"),
                params![user_id, provider.as_str()],
                map_credential_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ConnectorCredential>> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(&format!("{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY provider"))
                .map_err(map_sql_error)?;
            let rows = stmt.query_map(params![user_id], map_credential_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
    }

    async fn upsert(&self, credential: ConnectorCredential) -> Result<()> {
        with_connection(&self.db, move |conn| upsert_credential(conn, &credential)).await
    }

    async fn set_status(
        &self,
        user_id: &str,
        provider: ChatProvider,
        status: ConnectorStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE connector_credentials SET status = ?3, updated_at = ?4
                     WHERE user_id = ?1 AND provider = ?2",
                    params![user_id, provider.as_str(), status.as_str(), to_millis(at)],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(PsLangError::NotFound(format!("no {provider} credential")));
            }
            Ok(())
        })
        .await
    }

    async fn touch_last_sync(
        &self,
        user_id: &str,
        provider: ChatProvider,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.execute(
                "UPDATE connector_credentials SET last_sync_at = ?3
                 WHERE user_id = ?1 AND provider = ?2",
                params![user_id, provider.as_str(), to_millis(at)],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.execute("DELETE FROM connector_credentials WHERE user_id = ?1", params![user_id])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn upsert_credential(conn: &SqlCipherConnection, credential: &ConnectorCredential) -> Result<()> {
    conn.execute(
        "INSERT INTO connector_credentials (
            user_id, provider, access_token, refresh_token, status,
            last_sync_at, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(user_id, provider) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            status = excluded.status,
            last_sync_at = excluded.last_sync_at,
            updated_at = excluded.updated_at",
        params![
            credential.user_id,
            credential.provider.as_str(),
            credential.access_token,
            credential.refresh_token,
            credential.status.as_str(),
            credential.last_sync_at.map(to_millis),
            to_millis(credential.created_at),
            to_millis(credential.updated_at),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn map_credential_row(row: &Row<'_>) -> rusqlite::Result<ConnectorCredential> {
    let provider: String = row.get(1)?;
    let status: String = row.get(4)?;
    Ok(ConnectorCredential {
        user_id: row.get(0)?,
        provider: parse_column(1, &provider)?,
        access_token: row.get(2)?,
        refresh_token: row.get(3)?,
        status: parse_column(4, &status)?,
        last_sync_at: opt_from_millis(5, row.get(5)?)?,
        created_at: from_millis(6, row.get(6)?)?,
        updated_at: from_millis(7, row.get(7)?)?,
    })
}
