//! Port interfaces for connector linking and conversation sync
//!
//! These traits define the boundaries between core business logic and the
//! credential store, the conversation store and the chat provider APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pslang_domain::{
    ChatProvider, ConnectorCredential, ConnectorStatus, RemoteConversation,
    RemoteConversationSummary, Result, SyncedConversation, TokenGrant,
};

/// Trait for connector credential persistence
///
/// Credentials are unique per `(user_id, provider)`.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Get the credential for a user and provider
    async fn get(&self, user_id: &str, provider: ChatProvider)
        -> Result<Option<ConnectorCredential>>;

    /// List every credential of a user
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ConnectorCredential>>;

    /// Insert or overwrite the credential for its `(user_id, provider)`.
    /// `created_at` of an existing row is preserved.
    async fn upsert(&self, credential: ConnectorCredential) -> Result<()>;

    /// Change the status of an existing credential
    async fn set_status(
        &self,
        user_id: &str,
        provider: ChatProvider,
        status: ConnectorStatus,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Record the time of the last sync run
    async fn touch_last_sync(
        &self,
        user_id: &str,
        provider: ChatProvider,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Delete every credential of a user
    async fn delete_for_user(&self, user_id: &str) -> Result<()>;
}

/// Trait for synced conversation persistence
///
/// `external_conversation_id` is unique per `(user_id, provider)`.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Look up a stored conversation by its provider-side id
    async fn find_by_external_id(
        &self,
        user_id: &str,
        provider: ChatProvider,
        external_id: &str,
    ) -> Result<Option<SyncedConversation>>;

    /// Insert, or replace the stored record with the same external id.
    /// Messages are replaced as a whole.
    async fn save(&self, conversation: SyncedConversation) -> Result<()>;

    /// Every stored conversation of a user, newest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SyncedConversation>>;

    /// Number of stored conversations for a user and provider
    async fn count(&self, user_id: &str, provider: ChatProvider) -> Result<u64>;

    /// Delete every conversation of a user
    async fn delete_for_user(&self, user_id: &str) -> Result<()>;
}

/// Client for one external chat provider's OAuth and conversation APIs
#[async_trait]
pub trait ChatProviderClient: Send + Sync {
    fn provider(&self) -> ChatProvider;

    /// Whether an OAuth client id is configured
    fn is_configured(&self) -> bool;

    /// Authorization URL carrying the client id, redirect target, scopes and
    /// `state`.
    ///
    /// # Errors
    /// `Config` when the provider is not configured.
    fn authorize_url(&self, state: &str) -> Result<String>;

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    /// `TokenExchange` when the token endpoint answers with a non-success
    /// status.
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant>;

    /// Fetch the conversation index.
    ///
    /// # Errors
    /// `TokenExpired` when the provider rejects the access token.
    async fn list_conversations(&self, access_token: &str)
        -> Result<Vec<RemoteConversationSummary>>;

    /// Fetch one conversation with its messages
    async fn fetch_conversation(
        &self,
        access_token: &str,
        conversation_id: &str,
    ) -> Result<RemoteConversation>;
}
