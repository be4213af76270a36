//! Fakes for the external-service ports: chat providers, identity,
//! email and analytics.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use pslang_core::{AnalyticsClient, AnalyticsEvent, ChatProviderClient, EmailSender, IdentityProvider};
use pslang_domain::{
    ChatProvider, EmailMessage, IdentityUser, PsLangError, RawMessage, RemoteConversation,
    RemoteConversationSummary, Result as DomainResult, TokenGrant, UserFilter,
};

/// Scriptable chat provider.
pub struct FakeChatProvider {
    provider: ChatProvider,
    configured: bool,
    fail_exchange: Mutex<bool>,
    index_expired: Mutex<bool>,
    conversations: Mutex<Vec<RemoteConversation>>,
    failing_details: Mutex<HashSet<String>>,
    exchanged_codes: Mutex<Vec<String>>,
}

impl FakeChatProvider {
    pub fn new(provider: ChatProvider) -> Self {
        Self {
            provider,
            configured: true,
            fail_exchange: Mutex::new(false),
            index_expired: Mutex::new(false),
            conversations: Mutex::new(Vec::new()),
            failing_details: Mutex::new(HashSet::new()),
            exchanged_codes: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured(provider: ChatProvider) -> Self {
        Self { configured: false, ..Self::new(provider) }
    }

    pub fn fail_exchange(&self) {
        *self.fail_exchange.lock() = true;
    }

    pub fn expire_tokens(&self) {
        *self.index_expired.lock() = true;
    }

    pub fn fail_detail(&self, id: &str) {
        self.failing_details.lock().insert(id.to_string());
    }

    /// Add or replace a remote conversation.
    pub fn put_conversation(&self, id: &str, title: Option<&str>, messages: Vec<RawMessage>) {
        let mut conversations = self.conversations.lock();
        conversations.retain(|c| c.id != id);
        conversations.push(RemoteConversation {
            id: id.to_string(),
            title: title.map(str::to_string),
            messages,
        });
    }

    pub fn exchanged_codes(&self) -> Vec<String> {
        self.exchanged_codes.lock().clone()
    }
}

#[async_trait]
impl ChatProviderClient for FakeChatProvider {
    fn provider(&self) -> ChatProvider {
        self.provider
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn authorize_url(&self, state: &str) -> DomainResult<String> {
        if !self.configured {
            return Err(PsLangError::Config("no client id".into()));
        }
        Ok(format!("https://provider.test/authorize?client_id=test&state={state}"))
    }

    async fn exchange_code(&self, code: &str) -> DomainResult<TokenGrant> {
        self.exchanged_codes.lock().push(code.to_string());
        if *self.fail_exchange.lock() {
            return Err(PsLangError::TokenExchange("invalid_grant".into()));
        }
        Ok(TokenGrant {
            access_token: format!("access-{code}"),
            refresh_token: Some(format!("refresh-{code}")),
            expires_in: Some(3600),
        })
    }

    async fn list_conversations(
        &self,
        _access_token: &str,
    ) -> DomainResult<Vec<RemoteConversationSummary>> {
        if *self.index_expired.lock() {
            return Err(PsLangError::TokenExpired("401 from provider".into()));
        }
        Ok(self
            .conversations
            .lock()
            .iter()
            .map(|c| RemoteConversationSummary { id: c.id.clone(), title: c.title.clone(), updated_at: None })
            .collect())
    }

    async fn fetch_conversation(
        &self,
        _access_token: &str,
        conversation_id: &str,
    ) -> DomainResult<RemoteConversation> {
        if self.failing_details.lock().contains(conversation_id) {
            return Err(PsLangError::Upstream(format!("500 fetching {conversation_id}")));
        }
        self.conversations
            .lock()
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
            .ok_or_else(|| PsLangError::NotFound(conversation_id.to_string()))
    }
}

/// Records every call made by the gate.
#[derive(Default)]
pub struct RecordingAnalyticsClient {
    calls: Mutex<Vec<&'static str>>,
    captured: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingAnalyticsClient {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn captured(&self) -> Vec<AnalyticsEvent> {
        self.captured.lock().clone()
    }
}

#[async_trait]
impl AnalyticsClient for RecordingAnalyticsClient {
    fn enable(&self) {
        self.calls.lock().push("enable");
    }

    fn disable(&self) {
        self.calls.lock().push("disable");
    }

    fn disable_replay_only(&self) {
        self.calls.lock().push("disable_replay_only");
    }

    async fn capture(&self, event: AnalyticsEvent) -> DomainResult<()> {
        self.captured.lock().push(event);
        Ok(())
    }
}

/// Records sent mail; can be switched to fail every send.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<bool>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().clone()
    }

    pub fn fail_all(&self) {
        *self.failing.lock() = true;
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> DomainResult<()> {
        if *self.failing.lock() {
            return Err(PsLangError::Upstream("mail API down".into()));
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

/// Identity provider backed by a map of users; session token == user id.
#[derive(Default)]
pub struct FakeIdentityProvider {
    users: Mutex<HashMap<String, IdentityUser>>,
}

impl FakeIdentityProvider {
    pub fn add(&self, user: IdentityUser) {
        self.users.lock().insert(user.id.clone(), user);
    }

    pub fn get(&self, id: &str) -> Option<IdentityUser> {
        self.users.lock().get(id).cloned()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn current_user(&self, session_token: &str) -> DomainResult<IdentityUser> {
        self.get(session_token).ok_or_else(|| PsLangError::Unauthorized("unknown session".into()))
    }

    async fn list_users(&self, filter: &UserFilter) -> DomainResult<Vec<IdentityUser>> {
        let mut users: Vec<_> = self
            .users
            .lock()
            .values()
            .filter(|u| filter.email.as_deref().map_or(true, |e| u.email == e))
            .filter(|u| filter.role.map_or(true, |r| u.role() == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn update_metadata(
        &self,
        user_id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> DomainResult<IdentityUser> {
        let mut users = self.users.lock();
        let user = users.get_mut(user_id).ok_or_else(|| PsLangError::NotFound(user_id.into()))?;
        user.metadata.extend(patch);
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: &str) -> DomainResult<()> {
        self.users
            .lock()
            .remove(user_id)
            .map(|_| ())
            .ok_or_else(|| PsLangError::NotFound(user_id.into()))
    }
}
