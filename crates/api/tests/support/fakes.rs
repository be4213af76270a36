//! In-memory fakes for the external-service ports.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use pslang_core::{
    AnalyticsClient, AnalyticsEvent, ChatProviderClient, EmailSender, IdentityProvider,
};
use pslang_domain::{
    ChatProvider, EmailMessage, IdentityUser, PsLangError, RawMessage, RemoteConversation,
    RemoteConversationSummary, Result as DomainResult, TokenGrant, UserFilter,
};

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

/// Chat provider with scripted conversations.
pub struct FakeChatProvider {
    provider: ChatProvider,
    configured: bool,
    conversations: Mutex<Vec<RemoteConversation>>,
    failing_details: Mutex<HashSet<String>>,
}

impl FakeChatProvider {
    pub fn new(provider: ChatProvider) -> Self {
        Self {
            provider,
            configured: true,
            conversations: Mutex::new(Vec::new()),
            failing_details: Mutex::new(HashSet::new()),
        }
    }

    pub fn unconfigured(provider: ChatProvider) -> Self {
        Self { configured: false, ..Self::new(provider) }
    }

    pub fn put_conversation(&self, id: &str, title: &str, messages: Vec<RawMessage>) {
        let mut conversations = self.conversations.lock();
        conversations.retain(|c| c.id != id);
        conversations.push(RemoteConversation {
            id: id.to_string(),
            title: Some(title.to_string()),
            messages,
        });
    }

    pub fn fail_detail(&self, id: &str) {
        self.failing_details.lock().insert(id.to_string());
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
        Ok(format!("https://provider.test/authorize?client_id=test&state={state}"))
    }

    async fn exchange_code(&self, code: &str) -> DomainResult<TokenGrant> {
        if code == "bad-code" {
            return Err(PsLangError::TokenExchange("invalid_grant".into()));
        }
        Ok(TokenGrant {
            access_token: format!("access-{code}"),
            refresh_token: None,
            expires_in: Some(3600),
        })
    }

    async fn list_conversations(
        &self,
        _access_token: &str,
    ) -> DomainResult<Vec<RemoteConversationSummary>> {
        Ok(self
            .conversations
            .lock()
            .iter()
            .map(|c| RemoteConversationSummary {
                id: c.id.clone(),
                title: c.title.clone(),
                updated_at: None,
            })
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

/// Records enforcement calls and captured events for one session.
#[derive(Default)]
pub struct RecordingAnalytics {
    calls: Mutex<Vec<&'static str>>,
    captured: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingAnalytics {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn captured(&self) -> Vec<AnalyticsEvent> {
        self.captured.lock().clone()
    }
}

#[async_trait]
impl AnalyticsClient for RecordingAnalytics {
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

#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> DomainResult<()> {
        self.sent.lock().push(message.clone());
        Ok(())
    }
}
