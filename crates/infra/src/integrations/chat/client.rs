use async_trait::async_trait;
use pslang_core::ChatProviderClient;
use pslang_domain::{
    ChatProvider, ProviderConfig, PsLangError, RemoteConversation, RemoteConversationSummary,
    Result, TokenGrant,
};
use reqwest::{Method, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use super::wire::{ConversationBody, ConversationList, TokenResponse};
use crate::http::{read_json, status_error, HttpClient};

/// Authorization-code OAuth client plus conversation API for one provider.
pub struct HttpChatProviderClient {
    provider: ChatProvider,
    config: ProviderConfig,
    redirect_uri: String,
    http: HttpClient,
}

impl HttpChatProviderClient {
    /// The callback is served at `{public_url}/api/connectors/{provider}/callback`.
    pub fn new(
        provider: ChatProvider,
        config: ProviderConfig,
        public_url: &str,
        http: HttpClient,
    ) -> Self {
        let redirect_uri = format!(
            "{}/api/connectors/{}/callback",
            public_url.trim_end_matches('/'),
            provider.as_str()
        );
        Self { provider, config, redirect_uri, http }
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn client_id(&self) -> Result<&str> {
        self.config
            .client_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| PsLangError::Config(format!("{} client id is not set", self.provider)))
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ChatProviderClient for HttpChatProviderClient {
    fn provider(&self) -> ChatProvider {
        self.provider
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn authorize_url(&self, state: &str) -> Result<String> {
        let client_id = self.client_id()?;
        let mut url = Url::parse(&self.config.authorize_url).map_err(|e| {
            PsLangError::Config(format!("invalid {} authorize url: {e}", self.provider))
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);
        Ok(url.into())
    }

    #[instrument(skip(self, code), fields(provider = %self.provider))]
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        let client_id = self.client_id()?;
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", client_id),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let request = self.http.request(Method::POST, &self.config.token_url).form(&form);
        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| PsLangError::TokenExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "token endpoint rejected the authorization code");
            return Err(PsLangError::TokenExchange(status_error(status, &body).to_string()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PsLangError::TokenExchange(format!("malformed token response: {e}")))?;
        if token.access_token.trim().is_empty() {
            return Err(PsLangError::TokenExchange("token response has no access token".into()));
        }
        debug!(has_refresh = token.refresh_token.is_some(), "authorization code exchanged");
        Ok(token.into())
    }

    #[instrument(skip(self, access_token), fields(provider = %self.provider))]
    async fn list_conversations(
        &self,
        access_token: &str,
    ) -> Result<Vec<RemoteConversationSummary>> {
        let request =
            self.http.request(Method::GET, self.api_url("conversations")).bearer_auth(access_token);
        let response = self.http.send(request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(PsLangError::TokenExpired(format!("{} rejected the access token", self.provider)));
        }

        let list: ConversationList = read_json(response).await?;
        Ok(list.into_summaries())
    }

    #[instrument(skip(self, access_token), fields(provider = %self.provider))]
    async fn fetch_conversation(
        &self,
        access_token: &str,
        conversation_id: &str,
    ) -> Result<RemoteConversation> {
        let path = format!("conversations/{}", urlencoding::encode(conversation_id));
        let request = self.http.request(Method::GET, self.api_url(&path)).bearer_auth(access_token);
        let response = self.http.send(request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(PsLangError::TokenExpired(format!("{} rejected the access token", self.provider)));
        }

        let body: ConversationBody = read_json(response).await?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn http() -> HttpClient {
        HttpClient::builder().base_backoff(Duration::from_millis(5)).build().unwrap()
    }

    fn client(server: &MockServer, client_id: Option<&str>) -> HttpChatProviderClient {
        let config = ProviderConfig {
            client_id: client_id.map(str::to_string),
            client_secret: Some("secret".into()),
            authorize_url: format!("{}/oauth/authorize", server.uri()),
            token_url: format!("{}/oauth/token", server.uri()),
            api_base_url: format!("{}/v1/", server.uri()),
            scopes: vec!["conversations:read".into(), "profile".into()],
        };
        HttpChatProviderClient::new(ChatProvider::Anthropic, config, "https://pslang.dev/", http())
    }

    #[tokio::test]
    async fn authorize_url_carries_oauth_parameters() {
        let server = MockServer::start().await;
        let client = client(&server, Some("client-1"));

        let url = Url::parse(&client.authorize_url("signed.state").unwrap()).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs["client_id"], "client-1");
        assert_eq!(pairs["redirect_uri"], "https://pslang.dev/api/connectors/anthropic/callback");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["scope"], "conversations:read profile");
        assert_eq!(pairs["state"], "signed.state");
    }

    #[tokio::test]
    async fn unconfigured_client_cannot_build_authorize_url() {
        let server = MockServer::start().await;
        let client = client(&server, None);

        assert!(!client.is_configured());
        assert!(matches!(client.authorize_url("s"), Err(PsLangError::Config(_))));
    }

    #[tokio::test]
    async fn exchange_code_posts_form_and_parses_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at",
                "refresh_token": "rt",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = client(&server, Some("client-1")).exchange_code("abc").await.unwrap();
        assert_eq!(grant.access_token, "at");
        assert_eq!(grant.refresh_token.as_deref(), Some("rt"));
        assert_eq!(grant.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn rejected_code_is_a_token_exchange_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .mount(&server)
            .await;

        let result = client(&server, Some("client-1")).exchange_code("bad").await;
        assert!(matches!(result, Err(PsLangError::TokenExchange(_))), "got {result:?}");
    }

    #[tokio::test]
    async fn list_conversations_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/conversations"))
            .and(header("authorization", "Bearer at"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "id": "c1", "title": "First" }, { "id": "c2" }]
            })))
            .mount(&server)
            .await;

        let summaries = client(&server, Some("client-1")).list_conversations("at").await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].title.as_deref(), Some("First"));
        assert_eq!(summaries[1].title, None);
    }

    #[tokio::test]
    async fn unauthorized_listing_means_token_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/conversations"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = client(&server, Some("client-1")).list_conversations("stale").await;
        assert!(matches!(result, Err(PsLangError::TokenExpired(_))), "got {result:?}");
    }

    #[tokio::test]
    async fn fetch_conversation_maps_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/conversations/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "c1",
                "title": "Chat",
                "messages": [
                    { "role": "user", "content": "hello" },
                    { "role": "assistant", "content": "hi" }
                ]
            })))
            .mount(&server)
            .await;

        let conversation =
            client(&server, Some("client-1")).fetch_conversation("at", "c1").await.unwrap();
        assert_eq!(conversation.id, "c1");
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn missing_conversation_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/conversations/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = client(&server, Some("client-1")).fetch_conversation("at", "gone").await;
        assert!(matches!(result, Err(PsLangError::NotFound(_))));
    }
}
