//! SQLCipher-backed synced conversation repository.
//!
//! Messages and the transformed output are stored as JSON text. A save is a
//! single upsert on `(user_id, provider, external_conversation_id)`, so the
//! stored message list is always replaced as a whole.

use std::sync::Arc;

use async_trait::async_trait;
use pslang_core::ConversationRepository;
use pslang_domain::{ChatProvider, PsLangError, Result, SyncedConversation};
use rusqlite::{params, OptionalExtension, Row};

use super::manager::DbManager;
use super::{
    from_millis, json_column, map_sql_error, parse_column, to_millis, with_connection,
    SqlCipherConnection,
};

const SELECT_COLUMNS: &str = "SELECT id, user_id, provider, external_conversation_id, title,
        messages, transformed, content_hash, created_at, updated_at
     FROM synced_conversations";

pub struct SqlCipherConversationRepository {
    db: Arc<DbManager>,
}

impl SqlCipherConversationRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConversationRepository for SqlCipherConversationRepository {
    async fn find_by_external_id(
        &self,
        user_id: &str,
        provider: ChatProvider,
        external_id: &str,
    ) -> Result<Option<SyncedConversation>> {
        let user_id = user_id.to_string();
        let external_id = external_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                &format!(
                    "{SELECT_COLUMNS}
                     WHERE user_id = ?1 AND provider = ?2 AND external_conversation_id = ?3"
                ),
                params![user_id, provider.as_str(), external_id],
                map_conversation_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn save(&self, conversation: SyncedConversation) -> Result<()> {
        with_connection(&self.db, move |conn| save_conversation(conn, &conversation)).await
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SyncedConversation>> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY updated_at DESC, id"
                ))
                .map_err(map_sql_error)?;
            let rows =
                stmt.query_map(params![user_id], map_conversation_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
    }

    async fn count(&self, user_id: &str, provider: ChatProvider) -> Result<u64> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM synced_conversations WHERE user_id = ?1 AND provider = ?2",
                    params![user_id, provider.as_str()],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            u64::try_from(count).map_err(|_| PsLangError::Database(format!("negative count {count}")))
        })
        .await
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.execute("DELETE FROM synced_conversations WHERE user_id = ?1", params![user_id])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn save_conversation(conn: &SqlCipherConnection, conversation: &SyncedConversation) -> Result<()> {
    let messages = serde_json::to_string(&conversation.messages)
        .map_err(|e| PsLangError::Internal(format!("failed to encode messages: {e}")))?;
    let transformed = serde_json::to_string(&conversation.transformed)
        .map_err(|e| PsLangError::Internal(format!("failed to encode transform: {e}")))?;

    conn.execute(
        "INSERT INTO synced_conversations (
            id, user_id, provider, external_conversation_id, title,
            messages, transformed, content_hash, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(user_id, provider, external_conversation_id) DO UPDATE SET
            title = excluded.title,
            messages = excluded.messages,
            transformed = excluded.transformed,
            content_hash = excluded.content_hash,
            updated_at = excluded.updated_at",
        params![
            conversation.id,
            conversation.user_id,
            conversation.provider.as_str(),
            conversation.external_conversation_id,
            conversation.title,
            messages,
            transformed,
            conversation.content_hash,
            to_millis(conversation.created_at),
            to_millis(conversation.updated_at),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn map_conversation_row(row: &Row<'_>) -> rusqlite::Result<SyncedConversation> {
    let provider: String = row.get(2)?;
    let messages: String = row.get(5)?;
    let transformed: String = row.get(6)?;
    Ok(SyncedConversation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        provider: parse_column(2, &provider)?,
        external_conversation_id: row.get(3)?,
        title: row.get(4)?,
        messages: json_column(5, &messages)?,
        transformed: json_column(6, &transformed)?,
        content_hash: row.get(7)?,
        created_at: from_millis(8, row.get(8)?)?,
        updated_at: from_millis(9, row.get(9)?)?,
    })
}
