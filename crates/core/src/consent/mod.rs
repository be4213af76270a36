//! Consent and tier gate

pub mod gate;
pub mod ports;
pub mod watcher;

pub use gate::{enforce, evaluate, resolve_tier, Enforcement, TierGateService};
pub use watcher::{spawn_gate_watcher, GateState};
