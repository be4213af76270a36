//! Connector credentials linking a local account to an external chat
//! provider.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PsLangError;

/// External AI chat providers a user can link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatProvider {
    /// Claude conversations (`anthropic`, alias `claude`).
    Anthropic,
    /// ChatGPT conversations (`openai`, alias `chatgpt`).
    #[serde(rename = "openai")]
    OpenAi,
}

impl ChatProvider {
    /// Every supported provider.
    pub const ALL: [Self; 2] = [Self::Anthropic, Self::OpenAi];

    /// Wire name, also used as the URL path segment.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatProvider {
    type Err = PsLangError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" | "chatgpt" => Ok(Self::OpenAi),
            other => Err(PsLangError::BadRequest(format!("unknown provider: {other}"))),
        }
    }
}

/// Lifecycle state of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStatus {
    /// Tokens are stored and usable.
    Connected,
    /// Unlinked by the user; tokens were cleared.
    Disconnected,
    /// The provider rejected the stored token; relinking is required.
    Expired,
}

impl ConnectorStatus {
    /// Storage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Expired => "expired",
        }
    }
}

impl FromStr for ConnectorStatus {
    type Err = PsLangError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "connected" => Ok(Self::Connected),
            "disconnected" => Ok(Self::Disconnected),
            "expired" => Ok(Self::Expired),
            other => Err(PsLangError::Database(format!("unknown connector status: {other}"))),
        }
    }
}

/// Stored link between a user and one provider.
///
/// At most one credential exists per `(user_id, provider)`. `access_token` is
/// always present while `status` is `Connected`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorCredential {
    /// Local account that owns the link.
    pub user_id: String,
    /// Provider the tokens belong to.
    pub provider: ChatProvider,
    /// Bearer token for provider API calls; cleared on disconnect.
    pub access_token: Option<String>,
    /// Refresh token, when the provider issues one.
    pub refresh_token: Option<String>,
    /// Current lifecycle state.
    pub status: ConnectorStatus,
    /// Completion time of the last successful sync.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// First successful link.
    pub created_at: DateTime<Utc>,
    /// Last change to tokens, status or sync time.
    pub updated_at: DateTime<Utc>,
}

impl ConnectorCredential {
    /// Fresh `connected` credential built from a successful token exchange.
    #[must_use]
    pub fn connected(
        user_id: impl Into<String>,
        provider: ChatProvider,
        access_token: String,
        refresh_token: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            provider,
            access_token: Some(access_token),
            refresh_token,
            status: ConnectorStatus::Connected,
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Access token usable for provider calls, if any.
    #[must_use]
    pub fn usable_token(&self) -> Option<&str> {
        match self.status {
            ConnectorStatus::Connected => self.access_token.as_deref(),
            ConnectorStatus::Disconnected | ConnectorStatus::Expired => None,
        }
    }
}

// Tokens stay out of logs.
impl fmt::Debug for ConnectorCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorCredential")
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("access_token", &self.access_token.as_ref().map(|_| "[redacted]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("status", &self.status)
            .field("last_sync_at", &self.last_sync_at)
            .finish()
    }
}

/// Tokens returned by a provider's token endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Bearer token for provider API calls.
    pub access_token: String,
    /// Refresh token, when the provider issues one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds, when the provider reports one.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Token-free view of a credential returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSummary {
    /// Linked provider.
    pub provider: ChatProvider,
    /// `disconnected` for providers that were never linked.
    pub status: ConnectorStatus,
    /// OAuth client credentials are present for this provider.
    pub configured: bool,
    /// Completion time of the last successful sync.
    pub last_sync_at: Option<DateTime<Utc>>,
}
