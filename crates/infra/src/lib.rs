//! # PS-LANG Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLCipher repositories for preferences, credentials, conversations and
//!   account records
//! - The shared HTTP client
//! - Adapters for the chat providers, identity provider, email and analytics
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `pslang-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;

// Re-export commonly used items
pub use database::{
    DbManager, SqlCipherAccountRepository, SqlCipherConversationRepository,
    SqlCipherCredentialRepository, SqlCipherPreferenceRepository,
};
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::*;
