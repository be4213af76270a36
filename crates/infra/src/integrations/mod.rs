//! External service integrations

pub mod analytics;
pub mod chat;
pub mod email;
pub mod identity;

pub use analytics::HttpAnalyticsClient;
pub use chat::{provider_clients, HttpChatProviderClient};
pub use email::HttpEmailSender;
pub use identity::HttpIdentityProvider;
