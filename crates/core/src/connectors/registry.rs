//! Lookup of chat provider clients by provider

use std::collections::HashMap;
use std::sync::Arc;

use pslang_domain::{ChatProvider, PsLangError, Result};

use super::ports::ChatProviderClient;

/// Provider clients known to the service.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    clients: HashMap<ChatProvider, Arc<dyn ChatProviderClient>>,
}

impl ProviderRegistry {
    pub fn new(clients: impl IntoIterator<Item = Arc<dyn ChatProviderClient>>) -> Self {
        Self { clients: clients.into_iter().map(|client| (client.provider(), client)).collect() }
    }

    /// Client for `provider`.
    ///
    /// # Errors
    /// `Config` when no client is registered for the provider.
    pub fn client(&self, provider: ChatProvider) -> Result<&Arc<dyn ChatProviderClient>> {
        self.clients
            .get(&provider)
            .ok_or_else(|| PsLangError::Config(format!("no client registered for {provider}")))
    }

    /// Registered providers in declaration order.
    pub fn providers(&self) -> impl Iterator<Item = ChatProvider> + '_ {
        ChatProvider::ALL.into_iter().filter(|provider| self.clients.contains_key(provider))
    }
}
