//! SQLCipher-backed visitor preference repository.

use std::sync::Arc;

use async_trait::async_trait;
use pslang_core::PreferenceRepository;
use pslang_domain::{Result, VisitorPreferences, VisitorTier};
use rusqlite::{params, OptionalExtension};

use super::manager::DbManager;
use super::{from_millis, map_sql_error, parse_column, to_millis, with_connection, SqlCipherConnection};

/// One row per signed-in user holding their chosen tier.
pub struct SqlCipherPreferenceRepository {
    db: Arc<DbManager>,
}

impl SqlCipherPreferenceRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PreferenceRepository for SqlCipherPreferenceRepository {
    async fn get(&self, user_id: &str) -> Result<Option<VisitorPreferences>> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| query_preferences(conn, &user_id)).await
    }

    async fn upsert(&self, prefs: VisitorPreferences) -> Result<()> {
        with_connection(&self.db, move |conn| upsert_preferences(conn, &prefs)).await
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.execute("DELETE FROM visitor_preferences WHERE user_id = ?1", params![user_id])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_preferences(conn: &SqlCipherConnection, user_id: &str) -> Result<Option<VisitorPreferences>> {
    conn.query_row(
        "SELECT user_id, tier, updated_at FROM visitor_preferences WHERE user_id = ?1",
        params![user_id],
        |row| {
            let tier: String = row.get(1)?;
            Ok(VisitorPreferences {
                user_id: row.get(0)?,
                tier: parse_column::<VisitorTier>(1, &tier)?,
                updated_at: from_millis(2, row.get(2)?)?,
            })
        },
    )
    .optional()
    .map_err(map_sql_error)
}

fn upsert_preferences(conn: &SqlCipherConnection, prefs: &VisitorPreferences) -> Result<()> {
    conn.execute(
        "INSERT INTO visitor_preferences (user_id, tier, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET
            tier = excluded.tier,
            updated_at = excluded.updated_at",
        params![prefs.user_id, prefs.tier.as_str(), to_millis(prefs.updated_at)],
    )
    .map_err(map_sql_error)?;
    Ok(())
}
