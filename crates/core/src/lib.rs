//! # PS-LANG Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The tier gate, connector linker, sync service and conversation
//!   transformer
//! - Account and admin services
//!
//! ## Architecture Principles
//! - Only depends on `pslang-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod account;
pub mod connectors;
pub mod consent;
pub mod transform;
pub mod user;

// Re-export specific items to avoid ambiguity
pub use account::ports::{AccountRepository, EmailSender};
pub use account::{AccountDeps, AccountService};
pub use connectors::ports::{ChatProviderClient, ConversationRepository, CredentialRepository};
pub use connectors::{
    CallbackOutcome, CallbackParams, ConnectorLinker, ProviderRegistry, StateSigner, SyncService,
};
pub use consent::ports::{AnalyticsClient, AnalyticsEvent, PreferenceRepository};
pub use consent::{evaluate, enforce, spawn_gate_watcher, Enforcement, GateState, TierGateService};
pub use transform::transform;
pub use user::ports::IdentityProvider;
pub use user::AdminService;
