//! SQLCipher-backed storage for feedback, newsletter subscriptions and alpha
//! signups.

use std::sync::Arc;

use async_trait::async_trait;
use pslang_core::AccountRepository;
use pslang_domain::{AlphaSignup, Feedback, NewsletterSubscription, Result};
use rusqlite::{params, OptionalExtension, Row};

use super::manager::DbManager;
use super::{
    from_millis, map_sql_error, opt_from_millis, parse_column, to_millis, with_connection,
    SqlCipherConnection,
};

const FEEDBACK_COLUMNS: &str =
    "SELECT id, user_id, email, category, message, page, created_at FROM feedback";
const ALPHA_COLUMNS: &str =
    "SELECT id, email, name, use_case, user_id, created_at FROM alpha_signups";

pub struct SqlCipherAccountRepository {
    db: Arc<DbManager>,
}

impl SqlCipherAccountRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountRepository for SqlCipherAccountRepository {
    async fn insert_feedback(&self, feedback: Feedback) -> Result<()> {
        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO feedback (id, user_id, email, category, message, page, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    feedback.id,
                    feedback.user_id,
                    feedback.email,
                    feedback.category.as_str(),
                    feedback.message,
                    feedback.page,
                    to_millis(feedback.created_at),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn list_feedback(&self, limit: u32) -> Result<Vec<Feedback>> {
        with_connection(&self.db, move |conn| {
            query_feedback(
                conn,
                &format!("{FEEDBACK_COLUMNS} ORDER BY created_at DESC, id LIMIT ?1"),
                params![limit],
            )
        })
        .await
    }

    async fn feedback_for_user(&self, user_id: &str) -> Result<Vec<Feedback>> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            query_feedback(
                conn,
                &format!("{FEEDBACK_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC, id"),
                params![user_id],
            )
        })
        .await
    }

    async fn get_subscription(&self, email: &str) -> Result<Option<NewsletterSubscription>> {
        let email = email.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                "SELECT email, subscribed_at, unsubscribed_at
                 FROM newsletter_subscriptions WHERE email = ?1",
                params![email],
                |row| {
                    Ok(NewsletterSubscription {
                        email: row.get(0)?,
                        subscribed_at: from_millis(1, row.get(1)?)?,
                        unsubscribed_at: opt_from_millis(2, row.get(2)?)?,
                    })
                },
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn save_subscription(&self, subscription: NewsletterSubscription) -> Result<()> {
        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO newsletter_subscriptions (email, subscribed_at, unsubscribed_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(email) DO UPDATE SET
                    subscribed_at = excluded.subscribed_at,
                    unsubscribed_at = excluded.unsubscribed_at",
                params![
                    subscription.email,
                    to_millis(subscription.subscribed_at),
                    subscription.unsubscribed_at.map(to_millis),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn insert_alpha_signup(&self, signup: AlphaSignup) -> Result<()> {
        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO alpha_signups (id, email, name, use_case, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    signup.id,
                    signup.email,
                    signup.name,
                    signup.use_case,
                    signup.user_id,
                    to_millis(signup.created_at),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn find_alpha_signup(&self, email: &str) -> Result<Option<AlphaSignup>> {
        let email = email.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                &format!("{ALPHA_COLUMNS} WHERE email = ?1"),
                params![email],
                map_alpha_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn list_alpha_signups(&self, limit: u32) -> Result<Vec<AlphaSignup>> {
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(&format!("{ALPHA_COLUMNS} ORDER BY created_at DESC, id LIMIT ?1"))
                .map_err(map_sql_error)?;
            let rows = stmt.query_map(params![limit], map_alpha_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
    }

    async fn alpha_signup_for_user(&self, user_id: &str) -> Result<Option<AlphaSignup>> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                &format!("{ALPHA_COLUMNS} WHERE user_id = ?1 ORDER BY created_at LIMIT 1"),
                params![user_id],
                map_alpha_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        with_connection(&self.db, move |conn| {
            conn.execute("DELETE FROM feedback WHERE user_id = ?1", params![user_id])
                .map_err(map_sql_error)?;
            conn.execute("DELETE FROM alpha_signups WHERE user_id = ?1", params![user_id])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_feedback(
    conn: &SqlCipherConnection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Feedback>> {
    let mut stmt = conn.prepare(sql).map_err(map_sql_error)?;
    let rows = stmt.query_map(params, map_feedback_row).map_err(map_sql_error)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
}

fn map_feedback_row(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    let category: String = row.get(3)?;
    Ok(Feedback {
        id: row.get(0)?,
        user_id: row.get(1)?,
        email: row.get(2)?,
        category: parse_column(3, &category)?,
        message: row.get(4)?,
        page: row.get(5)?,
        created_at: from_millis(6, row.get(6)?)?,
    })
}

fn map_alpha_row(row: &Row<'_>) -> rusqlite::Result<AlphaSignup> {
    Ok(AlphaSignup {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        use_case: row.get(3)?,
        user_id: row.get(4)?,
        created_at: from_millis(5, row.get(5)?)?,
    })
}
