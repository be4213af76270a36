//! Configuration structures
//!
//! Loaded by `pslang_infra::config`; every section has serde defaults so a
//! config file only needs to name what differs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_STATE_TTL_SECS;
use crate::types::ChatProvider;

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener and public origin.
    #[serde(default)]
    pub server: ServerConfig,
    /// Encrypted local store.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Identity provider API.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Transactional email API.
    #[serde(default)]
    pub email: EmailConfig,
    /// Product analytics capture.
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// OAuth `state` token signing.
    #[serde(default)]
    pub oauth: OAuthStateConfig,
    /// Chat provider OAuth clients.
    #[serde(default)]
    pub connectors: ConnectorsConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public origin of the site, used for OAuth redirect targets.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), public_url: default_public_url() }
    }
}

/// SQLCipher database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// SQLCipher key. Required at startup.
    #[serde(default, skip_serializing)]
    pub encryption_key: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path(), pool_size: default_pool_size(), encryption_key: None }
    }
}

/// Identity provider API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// API origin.
    #[serde(default = "default_identity_url")]
    pub base_url: String,
    /// Server-side key for admin user management.
    #[serde(default, skip_serializing)]
    pub secret_key: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self { base_url: default_identity_url(), secret_key: None }
    }
}

/// Transactional email settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Send endpoint.
    #[serde(default = "default_email_url")]
    pub api_url: String,
    /// API key; mail is only logged when unset.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Sender address.
    #[serde(default = "default_email_from")]
    pub from: String,
    /// Receives a copy of every feedback submission when set.
    #[serde(default)]
    pub notify_address: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_email_url(),
            api_key: None,
            from: default_email_from(),
            notify_address: None,
        }
    }
}

/// Product analytics settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Capture endpoint; analytics is a no-op when unset.
    #[serde(default)]
    pub capture_url: Option<String>,
    /// Project key sent with every event.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

/// OAuth `state` token settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthStateConfig {
    /// Key for signing OAuth `state` tokens.
    #[serde(default, skip_serializing)]
    pub state_secret: String,
    /// How long a `state` token stays valid.
    #[serde(default = "default_state_ttl")]
    pub state_ttl_seconds: i64,
}

impl Default for OAuthStateConfig {
    fn default() -> Self {
        Self { state_secret: String::new(), state_ttl_seconds: default_state_ttl() }
    }
}

impl fmt::Debug for OAuthStateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthStateConfig")
            .field("state_secret", &"[redacted]")
            .field("state_ttl_seconds", &self.state_ttl_seconds)
            .finish()
    }
}

/// OAuth client settings per chat provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorsConfig {
    /// Anthropic (Claude) client.
    #[serde(default = "ProviderConfig::anthropic")]
    pub anthropic: ProviderConfig,
    /// OpenAI (ChatGPT) client.
    #[serde(default = "ProviderConfig::openai")]
    pub openai: ProviderConfig,
}

impl Default for ConnectorsConfig {
    fn default() -> Self {
        Self { anthropic: ProviderConfig::anthropic(), openai: ProviderConfig::openai() }
    }
}

impl ConnectorsConfig {
    /// Settings for `provider`.
    #[must_use]
    pub fn provider(&self, provider: ChatProvider) -> &ProviderConfig {
        match provider {
            ChatProvider::Anthropic => &self.anthropic,
            ChatProvider::OpenAi => &self.openai,
        }
    }

    /// Mutable settings for `provider`.
    pub fn provider_mut(&mut self, provider: ChatProvider) -> &mut ProviderConfig {
        match provider {
            ChatProvider::Anthropic => &mut self.anthropic,
            ChatProvider::OpenAi => &mut self.openai,
        }
    }
}

/// OAuth client registration and endpoints for one chat provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth client id; the provider is disabled when unset.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret.
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,
    /// Consent screen URL.
    pub authorize_url: String,
    /// Code exchange endpoint.
    pub token_url: String,
    /// Base URL of the conversation API.
    pub api_base_url: String,
    /// Scopes requested on authorize.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl ProviderConfig {
    /// Default Anthropic endpoints and scopes.
    #[must_use]
    pub fn anthropic() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            authorize_url: "https://claude.ai/oauth/authorize".to_string(),
            token_url: "https://console.anthropic.com/v1/oauth/token".to_string(),
            api_base_url: "https://api.anthropic.com/v1".to_string(),
            scopes: vec!["conversations:read".to_string(), "user:profile".to_string()],
        }
    }

    /// Default OpenAI endpoints and scopes.
    #[must_use]
    pub fn openai() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            authorize_url: "https://auth.openai.com/oauth/authorize".to_string(),
            token_url: "https://auth.openai.com/oauth/token".to_string(),
            api_base_url: "https://api.openai.com/v1".to_string(),
            scopes: vec!["conversations.read".to_string(), "openid".to_string()],
        }
    }

    /// A provider is usable once a non-empty client id is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client_id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_db_path() -> String {
    "pslang.db".to_string()
}

fn default_pool_size() -> u32 {
    8
}

fn default_identity_url() -> String {
    "https://api.clerk.com".to_string()
}

fn default_email_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_email_from() -> String {
    "PS-LANG <hello@pslang.dev>".to_string()
}

fn default_state_ttl() -> i64 {
    DEFAULT_STATE_TTL_SECS
}
