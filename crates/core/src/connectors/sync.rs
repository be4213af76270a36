//! Conversation sync: pull a provider's conversations into the local store.
//!
//! The loop is sequential (fetch, transform, upsert, one conversation at a
//! time). Per-item failures are collected into the report and never abort
//! the run.

use std::sync::Arc;

use chrono::Utc;
use pslang_domain::{
    ChatProvider, ConnectorStatus, PsLangError, RawMessage, RemoteConversationSummary, Result,
    SyncItem, SyncReport, SyncedConversation, UpsertOutcome,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::ports::{ChatProviderClient, ConversationRepository, CredentialRepository};
use super::registry::ProviderRegistry;
use crate::transform::transform;

/// Pulls remote conversations for connected credentials.
pub struct SyncService {
    registry: Arc<ProviderRegistry>,
    credentials: Arc<dyn CredentialRepository>,
    conversations: Arc<dyn ConversationRepository>,
}

impl SyncService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        credentials: Arc<dyn CredentialRepository>,
        conversations: Arc<dyn ConversationRepository>,
    ) -> Self {
        Self { registry, credentials, conversations }
    }

    /// Run one sync for `(user_id, provider)`.
    ///
    /// # Errors
    /// `NotConnected` without a connected credential; `TokenExpired` when the
    /// provider rejects the token on the index call (the credential is marked
    /// expired first).
    #[instrument(skip(self))]
    pub async fn sync(&self, user_id: &str, provider: ChatProvider) -> Result<SyncReport> {
        let credential = self
            .credentials
            .get(user_id, provider)
            .await?
            .ok_or_else(|| PsLangError::NotConnected(format!("no {provider} connector")))?;
        let token = credential
            .usable_token()
            .ok_or_else(|| {
                PsLangError::NotConnected(format!(
                    "{provider} connector is {}",
                    credential.status.as_str()
                ))
            })?
            .to_string();

        let client = self.registry.client(provider)?;

        let index = match client.list_conversations(&token).await {
            Ok(index) => index,
            Err(PsLangError::TokenExpired(msg)) => {
                warn!(%provider, "provider rejected access token; marking connector expired");
                self.credentials
                    .set_status(user_id, provider, ConnectorStatus::Expired, Utc::now())
                    .await?;
                return Err(PsLangError::TokenExpired(msg));
            }
            Err(err) => return Err(err),
        };

        let mut items = Vec::with_capacity(index.len());
        for summary in &index {
            let item = match self.sync_one(client.as_ref(), &token, user_id, summary).await {
                Ok(outcome) => SyncItem::Synced { external_id: summary.id.clone(), outcome },
                Err(err) => {
                    warn!(%provider, conversation_id = %summary.id, error = %err, "conversation sync failed");
                    SyncItem::Failed { external_id: summary.id.clone(), reason: err.to_string() }
                }
            };
            items.push(item);
        }

        let finished_at = Utc::now();
        self.credentials.touch_last_sync(user_id, provider, finished_at).await?;

        let report = SyncReport::from_items(provider, items, finished_at);
        info!(
            %provider,
            synced = report.synced_count,
            failed = report.failed_count,
            "sync finished"
        );
        Ok(report)
    }

    async fn sync_one(
        &self,
        client: &dyn ChatProviderClient,
        token: &str,
        user_id: &str,
        summary: &RemoteConversationSummary,
    ) -> Result<UpsertOutcome> {
        let provider = client.provider();
        let remote = client.fetch_conversation(token, &summary.id).await?;

        let transformed = transform(&remote.messages);
        let title = [remote.title.as_deref(), summary.title.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map_or_else(|| transformed.title.clone(), str::to_string);
        let content_hash = content_hash(&title, &remote.messages)?;

        let existing = self.conversations.find_by_external_id(user_id, provider, &summary.id).await?;
        let now = Utc::now();

        let (record, outcome) = match existing {
            Some(stored) if stored.content_hash == content_hash => {
                return Ok(UpsertOutcome::Unchanged);
            }
            Some(stored) => (
                SyncedConversation {
                    title,
                    messages: remote.messages,
                    transformed,
                    content_hash,
                    updated_at: now,
                    ..stored
                },
                UpsertOutcome::Updated,
            ),
            None => (
                SyncedConversation {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    provider,
                    external_conversation_id: summary.id.clone(),
                    title,
                    messages: remote.messages,
                    transformed,
                    content_hash,
                    created_at: now,
                    updated_at: now,
                },
                UpsertOutcome::Inserted,
            ),
        };

        self.conversations.save(record).await?;
        Ok(outcome)
    }
}

/// BLAKE3 hex digest of a conversation's title and messages.
pub fn content_hash(title: &str, messages: &[RawMessage]) -> Result<String> {
    let encoded = serde_json::to_vec(&(title, messages))
        .map_err(|e| PsLangError::Internal(format!("failed to encode conversation: {e}")))?;
    Ok(blake3::hash(&encoded).to_hex().to_string())
}
