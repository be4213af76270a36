//! Re-enforces the gate whenever identity or consent state changes.

use std::sync::Arc;

use pslang_domain::{ConsentSignal, VisitorIdentity};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::gate::{enforce, evaluate};
use super::ports::AnalyticsClient;

/// Inputs of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateState {
    pub identity: VisitorIdentity,
    pub consent: ConsentSignal,
}

impl GateState {
    /// Anonymous visitor without consent, the state before anything is known.
    #[must_use]
    pub fn initial() -> Self {
        Self { identity: VisitorIdentity::Anonymous, consent: ConsentSignal::Denied }
    }
}

/// Spawn a task that enforces the current state, then every update, until
/// the sender is dropped.
pub fn spawn_gate_watcher(
    mut updates: watch::Receiver<GateState>,
    client: Arc<dyn AnalyticsClient>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let state = updates.borrow_and_update().clone();
            let decision = evaluate(&state.identity, state.consent);
            let applied = enforce(&decision, client.as_ref());
            debug!(?applied, "gate re-enforced");

            if updates.changed().await.is_err() {
                break;
            }
        }
    })
}
