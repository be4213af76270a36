//! OAuth chat-provider adapters

mod client;
mod wire;

use std::sync::Arc;

use pslang_core::ChatProviderClient;
use pslang_domain::{ChatProvider, Config};

pub use client::HttpChatProviderClient;

use crate::http::HttpClient;

/// One client per supported provider, configured or not.
pub fn provider_clients(config: &Config, http: &HttpClient) -> Vec<Arc<dyn ChatProviderClient>> {
    ChatProvider::ALL
        .into_iter()
        .map(|provider| {
            Arc::new(HttpChatProviderClient::new(
                provider,
                config.connectors.provider(provider).clone(),
                &config.server.public_url,
                http.clone(),
            )) as Arc<dyn ChatProviderClient>
        })
        .collect()
}
