//! In-memory repository implementations for testing
//!
//! Each fake mirrors the uniqueness rules of the SQLite adapter so behaviour
//! tests exercise the same invariants.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pslang_core::{
    AccountRepository, ConversationRepository, CredentialRepository, PreferenceRepository,
};
use pslang_domain::{
    AlphaSignup, ChatProvider, ConnectorCredential, ConnectorStatus, Feedback,
    NewsletterSubscription, PsLangError, Result as DomainResult, SyncedConversation,
    VisitorPreferences,
};

/// In-memory `CredentialRepository` keyed by `(user_id, provider)`.
#[derive(Default)]
pub struct InMemoryCredentialRepository {
    rows: Mutex<HashMap<(String, ChatProvider), ConnectorCredential>>,
}

impl InMemoryCredentialRepository {
    pub fn stored(&self, user_id: &str, provider: ChatProvider) -> Option<ConnectorCredential> {
        self.rows.lock().get(&(user_id.to_string(), provider)).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn insert(&self, credential: ConnectorCredential) {
        self.rows.lock().insert((credential.user_id.clone(), credential.provider), credential);
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn get(
        &self,
        user_id: &str,
        provider: ChatProvider,
    ) -> DomainResult<Option<ConnectorCredential>> {
        Ok(self.stored(user_id, provider))
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<ConnectorCredential>> {
        Ok(self.rows.lock().values().filter(|c| c.user_id == user_id).cloned().collect())
    }

    async fn upsert(&self, mut credential: ConnectorCredential) -> DomainResult<()> {
        let mut rows = self.rows.lock();
        let key = (credential.user_id.clone(), credential.provider);
        if let Some(existing) = rows.get(&key) {
            credential.created_at = existing.created_at;
        }
        rows.insert(key, credential);
        Ok(())
    }

    async fn set_status(
        &self,
        user_id: &str,
        provider: ChatProvider,
        status: ConnectorStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut rows = self.rows.lock();
        let row = rows
            .get_mut(&(user_id.to_string(), provider))
            .ok_or_else(|| PsLangError::NotFound("credential".into()))?;
        row.status = status;
        row.updated_at = at;
        Ok(())
    }

    async fn touch_last_sync(
        &self,
        user_id: &str,
        provider: ChatProvider,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        if let Some(row) = self.rows.lock().get_mut(&(user_id.to_string(), provider)) {
            row.last_sync_at = Some(at);
        }
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &str) -> DomainResult<()> {
        self.rows.lock().retain(|(owner, _), _| owner != user_id);
        Ok(())
    }
}

/// In-memory `ConversationRepository`; counts writes so tests can assert
/// that unchanged re-syncs leave the store alone.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    rows: Mutex<Vec<SyncedConversation>>,
    writes: AtomicUsize,
}

impl InMemoryConversationRepository {
    pub fn all(&self) -> Vec<SyncedConversation> {
        self.rows.lock().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_by_external_id(
        &self,
        user_id: &str,
        provider: ChatProvider,
        external_id: &str,
    ) -> DomainResult<Option<SyncedConversation>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|c| {
                c.user_id == user_id
                    && c.provider == provider
                    && c.external_conversation_id == external_id
            })
            .cloned())
    }

    async fn save(&self, conversation: SyncedConversation) -> DomainResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|c| {
            c.user_id == conversation.user_id
                && c.provider == conversation.provider
                && c.external_conversation_id == conversation.external_conversation_id
        }) {
            Some(existing) => *existing = conversation,
            None => rows.push(conversation),
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<SyncedConversation>> {
        Ok(self.rows.lock().iter().filter(|c| c.user_id == user_id).cloned().collect())
    }

    async fn count(&self, user_id: &str, provider: ChatProvider) -> DomainResult<u64> {
        let rows = self.rows.lock();
        Ok(rows.iter().filter(|c| c.user_id == user_id && c.provider == provider).count() as u64)
    }

    async fn delete_for_user(&self, user_id: &str) -> DomainResult<()> {
        self.rows.lock().retain(|c| c.user_id != user_id);
        Ok(())
    }
}

/// In-memory `PreferenceRepository`; can be switched into a failing mode.
#[derive(Default)]
pub struct InMemoryPreferenceRepository {
    rows: Mutex<HashMap<String, VisitorPreferences>>,
    failing: Mutex<bool>,
}

impl InMemoryPreferenceRepository {
    pub fn fail_lookups(&self) {
        *self.failing.lock() = true;
    }
}

#[async_trait]
impl PreferenceRepository for InMemoryPreferenceRepository {
    async fn get(&self, user_id: &str) -> DomainResult<Option<VisitorPreferences>> {
        if *self.failing.lock() {
            return Err(PsLangError::Database("preference store unavailable".into()));
        }
        Ok(self.rows.lock().get(user_id).cloned())
    }

    async fn upsert(&self, prefs: VisitorPreferences) -> DomainResult<()> {
        self.rows.lock().insert(prefs.user_id.clone(), prefs);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &str) -> DomainResult<()> {
        self.rows.lock().remove(user_id);
        Ok(())
    }
}

/// In-memory `AccountRepository`.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    feedback: Mutex<Vec<Feedback>>,
    subscriptions: Mutex<HashMap<String, NewsletterSubscription>>,
    signups: Mutex<Vec<AlphaSignup>>,
}

impl InMemoryAccountRepository {
    pub fn feedback_count(&self) -> usize {
        self.feedback.lock().len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert_feedback(&self, feedback: Feedback) -> DomainResult<()> {
        self.feedback.lock().push(feedback);
        Ok(())
    }

    async fn list_feedback(&self, limit: u32) -> DomainResult<Vec<Feedback>> {
        let mut rows = self.feedback.lock().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn feedback_for_user(&self, user_id: &str) -> DomainResult<Vec<Feedback>> {
        Ok(self
            .feedback
            .lock()
            .iter()
            .filter(|f| f.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn get_subscription(&self, email: &str) -> DomainResult<Option<NewsletterSubscription>> {
        Ok(self.subscriptions.lock().get(email).cloned())
    }

    async fn save_subscription(&self, subscription: NewsletterSubscription) -> DomainResult<()> {
        self.subscriptions.lock().insert(subscription.email.clone(), subscription);
        Ok(())
    }

    async fn insert_alpha_signup(&self, signup: AlphaSignup) -> DomainResult<()> {
        let mut signups = self.signups.lock();
        if signups.iter().any(|s| s.email == signup.email) {
            return Err(PsLangError::Conflict("duplicate alpha signup".into()));
        }
        signups.push(signup);
        Ok(())
    }

    async fn find_alpha_signup(&self, email: &str) -> DomainResult<Option<AlphaSignup>> {
        Ok(self.signups.lock().iter().find(|s| s.email == email).cloned())
    }

    async fn alpha_signup_for_user(&self, user_id: &str) -> DomainResult<Option<AlphaSignup>> {
        Ok(self.signups.lock().iter().find(|s| s.user_id.as_deref() == Some(user_id)).cloned())
    }

    async fn list_alpha_signups(&self, limit: u32) -> DomainResult<Vec<AlphaSignup>> {
        let mut rows = self.signups.lock().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn delete_for_user(&self, user_id: &str) -> DomainResult<()> {
        self.feedback.lock().retain(|f| f.user_id.as_deref() != Some(user_id));
        self.signups.lock().retain(|s| s.user_id.as_deref() != Some(user_id));
        Ok(())
    }
}
