//! HTTP identity provider.
//!
//! Sessions are resolved with the caller's own token against `/v1/me`;
//! administrative calls authenticate with the backend secret key.

use async_trait::async_trait;
use pslang_core::IdentityProvider;
use pslang_domain::{IdentityConfig, IdentityUser, PsLangError, Result, UserFilter};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::http::{read_json, status_error, HttpClient};

pub struct HttpIdentityProvider {
    base_url: String,
    secret_key: Option<String>,
    http: HttpClient,
}

impl HttpIdentityProvider {
    pub fn new(config: &IdentityConfig, http: HttpClient) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone().filter(|k| !k.trim().is_empty()),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin_request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| PsLangError::Config("identity secret key is not set".into()))?;
        Ok(self.http.request(method, self.url(path)).bearer_auth(key))
    }
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddressBody>,
    #[serde(default, alias = "metadata")]
    public_metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EmailAddressBody {
    email_address: String,
}

impl From<UserBody> for IdentityUser {
    fn from(body: UserBody) -> Self {
        let email = body
            .email
            .or_else(|| body.email_addresses.into_iter().next().map(|e| e.email_address))
            .unwrap_or_default();
        Self { id: body.id, email, metadata: body.public_metadata }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip_all)]
    async fn current_user(&self, session_token: &str) -> Result<IdentityUser> {
        if session_token.trim().is_empty() {
            return Err(PsLangError::Unauthorized("missing session token".into()));
        }

        let request = self.http.request(Method::GET, self.url("/v1/me")).bearer_auth(session_token);
        let response = self.http.send(request).await?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(PsLangError::Unauthorized("session is invalid or expired".into()))
            }
            _ => read_json::<UserBody>(response).await.map(Into::into),
        }
    }

    #[instrument(skip(self))]
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<IdentityUser>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(email) = &filter.email {
            query.push(("email_address", email.clone()));
        }
        if let Some(limit) = filter.limit {
            query.push(("limit", limit.to_string()));
        }

        let request = self.admin_request(Method::GET, "/v1/users")?.query(&query);
        let bodies: Vec<UserBody> = read_json(self.http.send(request).await?).await?;

        let users = bodies.into_iter().map(IdentityUser::from);
        Ok(match filter.role {
            Some(role) => users.filter(|u| u.role() == role).collect(),
            None => users.collect(),
        })
    }

    #[instrument(skip(self, patch))]
    async fn update_metadata(&self, user_id: &str, patch: Map<String, Value>) -> Result<IdentityUser> {
        let path = format!("/v1/users/{}/metadata", urlencoding::encode(user_id));
        let request = self
            .admin_request(Method::PATCH, &path)?
            .json(&json!({ "public_metadata": patch }));
        let body: UserBody = read_json(self.http.send(request).await?).await?;
        Ok(body.into())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> Result<()> {
        let path = format!("/v1/users/{}", urlencoding::encode(user_id));
        let response = self.http.send(self.admin_request(Method::DELETE, &path)?).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}
