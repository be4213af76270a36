//! Connector linking and conversation sync

pub mod linker;
pub mod ports;
pub mod registry;
pub mod state_token;
pub mod sync;

pub use linker::{error_redirect, success_redirect, CallbackOutcome, CallbackParams, ConnectorLinker};
pub use registry::ProviderRegistry;
pub use state_token::{StateClaims, StateSigner};
pub use sync::SyncService;
