//! OAuth connector linker: authorize, callback, status and disconnect.
//!
//! Lifecycle of a credential:
//! `disconnected -> authorizing -> connected -> (expired | disconnected)`.
//! "authorizing" is never stored; it lives in the signed `state` token.

use std::sync::Arc;

use chrono::Utc;
use pslang_domain::constants::CONNECTOR_SETTINGS_PATH;
use pslang_domain::{
    ChatProvider, ConnectorCredential, ConnectorStatus, ConnectorSummary, PsLangError, Result,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::form_urlencoded;

use super::ports::CredentialRepository;
use super::registry::ProviderRegistry;
use super::state_token::StateSigner;

/// Query parameters a provider sends to the callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Result of a callback that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Connected { user_id: String, provider: ChatProvider },
    /// The provider reported an error (e.g. the user declined).
    Denied { provider: ChatProvider, error: String },
}

impl CallbackOutcome {
    /// Where the browser is sent after the callback.
    #[must_use]
    pub fn redirect_url(&self, public_url: &str) -> String {
        match self {
            Self::Connected { provider, .. } => success_redirect(public_url, *provider),
            Self::Denied { provider, error } => error_redirect(public_url, *provider, error),
        }
    }
}

/// Settings page URL reporting a new connection.
#[must_use]
pub fn success_redirect(public_url: &str, provider: ChatProvider) -> String {
    settings_url(public_url, &[("connected", provider.as_str())])
}

/// Settings page URL reporting a failed connection.
#[must_use]
pub fn error_redirect(public_url: &str, provider: ChatProvider, error: &str) -> String {
    settings_url(public_url, &[("error", error), ("provider", provider.as_str())])
}

fn settings_url(public_url: &str, params: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new()).extend_pairs(params).finish();
    format!("{}{CONNECTOR_SETTINGS_PATH}?{query}", public_url.trim_end_matches('/'))
}

/// Links local accounts to chat providers.
pub struct ConnectorLinker {
    registry: Arc<ProviderRegistry>,
    credentials: Arc<dyn CredentialRepository>,
    signer: Arc<StateSigner>,
}

impl ConnectorLinker {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        credentials: Arc<dyn CredentialRepository>,
        signer: Arc<StateSigner>,
    ) -> Self {
        Self { registry, credentials, signer }
    }

    /// Build the provider authorization URL for a signed-in user.
    #[instrument(skip(self))]
    pub fn authorize(&self, user_id: &str, provider: ChatProvider) -> Result<String> {
        if user_id.trim().is_empty() {
            return Err(PsLangError::Unauthorized("sign in to connect a provider".into()));
        }

        let client = self.registry.client(provider)?;
        if !client.is_configured() {
            return Err(PsLangError::Config(format!("{provider} OAuth client is not configured")));
        }

        let state = self.signer.issue(user_id, provider, Utc::now())?;
        client.authorize_url(&state)
    }

    /// Handle the provider redirect back to us.
    ///
    /// # Errors
    /// `BadRequest` for missing parameters or an invalid state token,
    /// `TokenExchange` when the code exchange fails. Nothing is persisted on
    /// any error path.
    #[instrument(skip(self, params), fields(has_code = params.code.is_some()))]
    pub async fn callback(
        &self,
        provider: ChatProvider,
        params: CallbackParams,
    ) -> Result<CallbackOutcome> {
        if let Some(error) = params.error.filter(|e| !e.is_empty()) {
            info!(%provider, error = %error, "provider returned an authorization error");
            return Ok(CallbackOutcome::Denied { provider, error });
        }

        let (Some(code), Some(state)) = (
            params.code.filter(|c| !c.is_empty()),
            params.state.filter(|s| !s.is_empty()),
        ) else {
            return Err(PsLangError::BadRequest("missing code or state".into()));
        };

        let claims = self.signer.verify(&state, provider, Utc::now())?;
        let client = self.registry.client(provider)?;

        let grant = client.exchange_code(&code).await.map_err(|err| {
            warn!(%provider, error = %err, "token exchange failed");
            match err {
                PsLangError::TokenExchange(_) => err,
                other => PsLangError::TokenExchange(other.to_string()),
            }
        })?;

        let credential = ConnectorCredential::connected(
            claims.user_id.clone(),
            provider,
            grant.access_token,
            grant.refresh_token,
            Utc::now(),
        );
        self.credentials.upsert(credential).await?;

        info!(%provider, user_id = %claims.user_id, "connector linked");
        Ok(CallbackOutcome::Connected { user_id: claims.user_id, provider })
    }

    /// Connector state for every registered provider.
    pub async fn status(&self, user_id: &str) -> Result<Vec<ConnectorSummary>> {
        let credentials = self.credentials.list_for_user(user_id).await?;

        let mut summaries = Vec::new();
        for provider in self.registry.providers() {
            let configured = self.registry.client(provider)?.is_configured();
            let stored = credentials.iter().find(|c| c.provider == provider);
            summaries.push(ConnectorSummary {
                provider,
                status: stored.map_or(ConnectorStatus::Disconnected, |c| c.status),
                configured,
                last_sync_at: stored.and_then(|c| c.last_sync_at),
            });
        }
        Ok(summaries)
    }

    /// Mark a credential disconnected and drop its tokens.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, user_id: &str, provider: ChatProvider) -> Result<()> {
        let Some(mut credential) = self.credentials.get(user_id, provider).await? else {
            return Err(PsLangError::NotFound(format!("no {provider} connector")));
        };

        credential.status = ConnectorStatus::Disconnected;
        credential.access_token = None;
        credential.refresh_token = None;
        credential.updated_at = Utc::now();
        self.credentials.upsert(credential).await?;

        info!(%provider, "connector disconnected");
        Ok(())
    }
}
