//! Tier gate: decides whether analytics and session replay may run.

use std::sync::Arc;

use chrono::Utc;
use pslang_domain::{
    ConsentSignal, GateDecision, Result, TierLookup, TierPermissions, VisitorIdentity,
    VisitorPreferences, VisitorTier, ANONYMOUS_DEFAULT_TIER,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::ports::{AnalyticsClient, PreferenceRepository};

/// What `enforce` did to the analytics client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforcement {
    Disabled,
    ReplayDisabled,
    Enabled,
}

/// Tier a visitor's permissions are taken from, or `None` when the gate must
/// fail closed.
#[must_use]
pub fn resolve_tier(identity: &VisitorIdentity) -> Option<VisitorTier> {
    match identity {
        VisitorIdentity::Anonymous => Some(ANONYMOUS_DEFAULT_TIER),
        VisitorIdentity::SignedIn { tier: TierLookup::Resolved(tier), .. } => Some(*tier),
        VisitorIdentity::SignedIn { tier: TierLookup::Pending | TierLookup::Missing, .. } => None,
    }
}

/// Pure gate function. Consent is necessary but not sufficient.
#[must_use]
pub fn evaluate(identity: &VisitorIdentity, consent: ConsentSignal) -> GateDecision {
    let tier = resolve_tier(identity);
    let permissions = tier.map_or_else(TierPermissions::none, VisitorTier::permissions);
    let analytics = consent.is_granted() && permissions.allow_analytics;
    let session_replay = analytics && permissions.allow_session_replay;

    GateDecision { tier, consent, permissions, analytics, session_replay }
}

/// Push a decision into the analytics client.
pub fn enforce(decision: &GateDecision, client: &dyn AnalyticsClient) -> Enforcement {
    if !decision.analytics {
        client.disable();
        Enforcement::Disabled
    } else if !decision.session_replay {
        client.disable_replay_only();
        Enforcement::ReplayDisabled
    } else {
        client.enable();
        Enforcement::Enabled
    }
}

/// Reads stored tiers and turns them into gate decisions.
pub struct TierGateService {
    preferences: Arc<dyn PreferenceRepository>,
}

impl TierGateService {
    pub fn new(preferences: Arc<dyn PreferenceRepository>) -> Self {
        Self { preferences }
    }

    /// Build the visitor identity for an optional signed-in user.
    ///
    /// A failed lookup stays `Pending` so the gate fails closed.
    pub async fn identify(&self, user_id: Option<&str>) -> VisitorIdentity {
        let Some(user_id) = user_id else {
            return VisitorIdentity::Anonymous;
        };

        let tier = match self.preferences.get(user_id).await {
            Ok(Some(prefs)) => TierLookup::Resolved(prefs.tier),
            Ok(None) => TierLookup::Missing,
            Err(err) => {
                warn!(user_id, error = %err, "tier lookup failed; failing closed");
                TierLookup::Pending
            }
        };

        VisitorIdentity::SignedIn { user_id: user_id.to_string(), tier }
    }

    /// Evaluate the gate for a visitor.
    #[instrument(skip(self))]
    pub async fn decide(&self, user_id: Option<&str>, consent: ConsentSignal) -> GateDecision {
        let identity = self.identify(user_id).await;
        let decision = evaluate(&identity, consent);
        debug!(
            tier = ?decision.tier,
            analytics = decision.analytics,
            session_replay = decision.session_replay,
            "gate evaluated"
        );
        decision
    }

    /// Stored preferences of a user.
    pub async fn preferences(&self, user_id: &str) -> Result<Option<VisitorPreferences>> {
        self.preferences.get(user_id).await
    }

    /// Persist a new tier for a user.
    #[instrument(skip(self))]
    pub async fn set_tier(&self, user_id: &str, tier: VisitorTier) -> Result<VisitorPreferences> {
        let prefs = VisitorPreferences { user_id: user_id.to_string(), tier, updated_at: Utc::now() };
        self.preferences.upsert(prefs.clone()).await?;
        Ok(prefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in(tier: TierLookup) -> VisitorIdentity {
        VisitorIdentity::SignedIn { user_id: "user_1".into(), tier }
    }

    #[test]
    fn analytics_is_consent_and_tier_permission() {
        let consents = [ConsentSignal::Granted, ConsentSignal::Denied];
        for tier in VisitorTier::ALL {
            for consent in consents {
                let decision = evaluate(&signed_in(TierLookup::Resolved(tier)), consent);
                assert_eq!(
                    decision.analytics,
                    consent.is_granted() && tier.permissions().allow_analytics
                );
                assert!(!decision.session_replay || decision.analytics);
            }
        }
    }

    #[test]
    fn anonymous_with_denied_consent_runs_nothing() {
        let decision = evaluate(&VisitorIdentity::Anonymous, ConsentSignal::Denied);
        assert_eq!(decision.tier, Some(VisitorTier::Standard));
        assert!(!decision.analytics);
        assert!(!decision.session_replay);
    }

    #[test]
    fn anonymous_with_consent_gets_analytics_without_replay() {
        let decision = evaluate(&VisitorIdentity::Anonymous, ConsentSignal::Granted);
        assert!(decision.analytics);
        assert!(!decision.session_replay);
    }

    #[test]
    fn research_contributor_with_consent_gets_everything() {
        let identity = signed_in(TierLookup::Resolved(VisitorTier::ResearchContributor));
        let decision = evaluate(&identity, ConsentSignal::Granted);
        assert!(decision.analytics);
        assert!(decision.session_replay);
    }

    #[test]
    fn unresolved_lookups_fail_closed() {
        for lookup in [TierLookup::Pending, TierLookup::Missing] {
            let decision = evaluate(&signed_in(lookup), ConsentSignal::Granted);
            assert_eq!(decision.tier, None);
            assert_eq!(decision.permissions, TierPermissions::none());
            assert!(!decision.analytics);
        }
    }
}
