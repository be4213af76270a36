//! Shared test helpers for `pslang-core` integration tests.
//!
//! In-memory fakes for every core port so behaviour tests can run without a
//! database or network.
#![allow(dead_code)]

pub mod fakes;
pub mod repositories;

use std::sync::Arc;

use pslang_core::{
    AccountDeps, AccountService, ChatProviderClient, ConnectorLinker, ProviderRegistry,
    StateSigner, SyncService,
};
use pslang_domain::{ChatProvider, IdentityUser};
use serde_json::json;

pub use fakes::{FakeChatProvider, FakeIdentityProvider, RecordingAnalyticsClient, RecordingEmailSender};
pub use repositories::{
    InMemoryAccountRepository, InMemoryConversationRepository, InMemoryCredentialRepository,
    InMemoryPreferenceRepository,
};

pub const STATE_SECRET: &str = "test-state-secret-0123456789abcdef";
pub const PUBLIC_URL: &str = "https://pslang.test";

/// Everything wired together against in-memory fakes.
pub struct Harness {
    pub provider: Arc<FakeChatProvider>,
    pub credentials: Arc<InMemoryCredentialRepository>,
    pub conversations: Arc<InMemoryConversationRepository>,
    pub preferences: Arc<InMemoryPreferenceRepository>,
    pub accounts: Arc<InMemoryAccountRepository>,
    pub email: Arc<RecordingEmailSender>,
    pub identity: Arc<FakeIdentityProvider>,
    pub signer: Arc<StateSigner>,
    pub linker: ConnectorLinker,
    pub sync: SyncService,
    pub account_service: Arc<AccountService>,
}

impl Harness {
    pub fn new() -> Self {
        let provider = Arc::new(FakeChatProvider::new(ChatProvider::Anthropic));
        let credentials = Arc::new(InMemoryCredentialRepository::default());
        let conversations = Arc::new(InMemoryConversationRepository::default());
        let preferences = Arc::new(InMemoryPreferenceRepository::default());
        let accounts = Arc::new(InMemoryAccountRepository::default());
        let email = Arc::new(RecordingEmailSender::default());
        let identity = Arc::new(FakeIdentityProvider::default());
        let signer = Arc::new(StateSigner::new(STATE_SECRET, 600).unwrap());

        let registry = Arc::new(ProviderRegistry::new([
            provider.clone() as Arc<dyn ChatProviderClient>,
            Arc::new(FakeChatProvider::unconfigured(ChatProvider::OpenAi)),
        ]));

        let linker = ConnectorLinker::new(registry.clone(), credentials.clone(), signer.clone());
        let sync = SyncService::new(registry.clone(), credentials.clone(), conversations.clone());
        let account_service = Arc::new(
            AccountService::new(AccountDeps {
                accounts: accounts.clone(),
                preferences: preferences.clone(),
                credentials: credentials.clone(),
                conversations: conversations.clone(),
                email: email.clone(),
                registry,
            })
            .with_feedback_notifications(Some("team@pslang.test".into())),
        );

        Self {
            provider,
            credentials,
            conversations,
            preferences,
            accounts,
            email,
            identity,
            signer,
            linker,
            sync,
            account_service,
        }
    }
}

/// Identity user with a role stored in metadata.
pub fn user(id: &str, role: &str) -> IdentityUser {
    let mut metadata = serde_json::Map::new();
    metadata.insert("role".into(), json!(role));
    IdentityUser { id: id.into(), email: format!("{id}@example.com"), metadata }
}
