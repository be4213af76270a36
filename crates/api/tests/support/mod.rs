//! Router test harness: a real SQLCipher database in a temp dir, with fakes
//! standing in for every external service.

#![allow(dead_code)]

mod fakes;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
pub use fakes::{FakeChatProvider, FakeIdentityProvider, RecordingAnalytics, RecordingEmailSender};
use pslang_api::{router, Adapters, AnalyticsFactory, AppContext};
use pslang_core::{AnalyticsClient, ChatProviderClient};
use pslang_domain::{ChatProvider, Config, IdentityUser, UserRole};
use pslang_infra::DbManager;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const TEST_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const PUBLIC_URL: &str = "https://pslang.test";

pub struct TestApp {
    pub router: Router,
    pub identity: Arc<FakeIdentityProvider>,
    pub anthropic: Arc<FakeChatProvider>,
    pub email: Arc<RecordingEmailSender>,
    pub analytics: Arc<parking_lot::Mutex<Vec<Arc<RecordingAnalytics>>>>,
    _temp_dir: TempDir,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.public_url = PUBLIC_URL.to_string();
    config.oauth.state_secret = "router-test-state-secret-0123456789abcdef".to_string();
    config.email.notify_address = Some("team@pslang.test".to_string());
    config
}

pub fn spawn_app() -> TestApp {
    let temp_dir = TempDir::new().expect("failed to create temporary database directory");
    let db = Arc::new(
        DbManager::new(temp_dir.path().join("pslang.db"), 4, Some(TEST_KEY))
            .expect("failed to initialise SQLCipher manager"),
    );
    db.run_migrations().expect("failed to run schema migrations");

    let identity = Arc::new(FakeIdentityProvider::default());
    let anthropic = Arc::new(FakeChatProvider::new(ChatProvider::Anthropic));
    let openai = Arc::new(FakeChatProvider::unconfigured(ChatProvider::OpenAi));
    let email = Arc::new(RecordingEmailSender::default());

    let analytics = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sessions = analytics.clone();
    let factory: AnalyticsFactory = Arc::new(move || {
        let client = Arc::new(RecordingAnalytics::default());
        sessions.lock().push(client.clone());
        client as Arc<dyn AnalyticsClient>
    });

    let adapters = Adapters {
        identity: identity.clone(),
        chat_clients: vec![anthropic.clone() as Arc<dyn ChatProviderClient>, openai],
        email: email.clone(),
        analytics: factory,
    };
    let ctx = AppContext::with_adapters(test_config(), db, adapters)
        .expect("failed to build application context");

    TestApp {
        router: router(Arc::new(ctx)),
        identity,
        anthropic,
        email,
        analytics,
        _temp_dir: temp_dir,
    }
}

impl TestApp {
    /// Register a user; the session token is the user id.
    pub fn user(&self, id: &str, role: UserRole) -> IdentityUser {
        let mut metadata = serde_json::Map::new();
        metadata.insert("role".into(), json!(role.as_str()));
        let user = IdentityUser { id: id.into(), email: format!("{id}@pslang.test"), metadata };
        self.identity.add(user.clone());
        user
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request builds"))
            .await
            .expect("router is infallible")
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send(method, uri, token, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body is readable");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is JSON")
        };
        (status, value)
    }

    /// Analytics sessions opened so far, oldest first.
    pub fn analytics_sessions(&self) -> Vec<Arc<RecordingAnalytics>> {
        self.analytics.lock().clone()
    }
}

/// `Location` header of a redirect response.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect has a location")
        .to_string()
}

/// Value of query parameter `name` in `url`.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
