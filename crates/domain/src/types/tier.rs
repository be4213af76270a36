//! Visitor tiers, consent signals and the permissions derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PsLangError;

/// Data-retention classification of a visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorTier {
    /// Only what the site needs to function; no analytics.
    Essential,
    /// Anonymous product analytics without session replay.
    Standard,
    /// Full analytics, session replay and behaviour tracking.
    ResearchContributor,
}

/// Tier applied to visitors without a session.
pub const ANONYMOUS_DEFAULT_TIER: VisitorTier = VisitorTier::Standard;

impl VisitorTier {
    /// Every tier, least to most permissive.
    pub const ALL: [Self; 3] = [Self::Essential, Self::Standard, Self::ResearchContributor];

    /// Stable wire and storage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Essential => "essential",
            Self::Standard => "standard",
            Self::ResearchContributor => "research_contributor",
        }
    }

    /// Capability set granted by this tier.
    #[must_use]
    pub const fn permissions(self) -> TierPermissions {
        match self {
            Self::Essential => TierPermissions {
                allow_analytics: false,
                allow_session_replay: false,
                allow_performance_monitoring: true,
                allow_behavior_tracking: false,
            },
            Self::Standard => TierPermissions {
                allow_analytics: true,
                allow_session_replay: false,
                allow_performance_monitoring: true,
                allow_behavior_tracking: false,
            },
            Self::ResearchContributor => TierPermissions {
                allow_analytics: true,
                allow_session_replay: true,
                allow_performance_monitoring: true,
                allow_behavior_tracking: true,
            },
        }
    }
}

impl fmt::Display for VisitorTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitorTier {
    type Err = PsLangError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "essential" => Ok(Self::Essential),
            "standard" => Ok(Self::Standard),
            "research_contributor" => Ok(Self::ResearchContributor),
            other => Err(PsLangError::BadRequest(format!("unknown tier: {other}"))),
        }
    }
}

/// Capability set derived from a tier. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPermissions {
    /// Product analytics events may be captured.
    pub allow_analytics: bool,
    /// Session recordings may be captured. Implies `allow_analytics`.
    pub allow_session_replay: bool,
    /// Page performance metrics may be reported.
    pub allow_performance_monitoring: bool,
    /// Interaction heatmaps and click tracking may run.
    pub allow_behavior_tracking: bool,
}

impl TierPermissions {
    /// Most restrictive set, used while a tier lookup is unresolved.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            allow_analytics: false,
            allow_session_replay: false,
            allow_performance_monitoring: false,
            allow_behavior_tracking: false,
        }
    }
}

/// Externally sourced cookie/storage consent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentSignal {
    /// The visitor accepted analytics cookies.
    Granted,
    /// The visitor declined, or has not answered yet.
    Denied,
}

impl ConsentSignal {
    /// `true` for [`ConsentSignal::Granted`].
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl FromStr for ConsentSignal {
    type Err = PsLangError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "granted" | "true" | "1" | "yes" => Ok(Self::Granted),
            "denied" | "false" | "0" | "no" => Ok(Self::Denied),
            other => Err(PsLangError::BadRequest(format!("unknown consent value: {other}"))),
        }
    }
}

/// State of the tier lookup for a signed-in visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "tier", rename_all = "snake_case")]
pub enum TierLookup {
    /// The preference record has not been read yet.
    Pending,
    /// The visitor has no persisted preference record.
    Missing,
    /// The stored tier.
    Resolved(VisitorTier),
}

/// Identity state of the visitor being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisitorIdentity {
    /// No session; the anonymous default tier applies.
    Anonymous,
    /// Signed-in user and the state of their tier lookup.
    SignedIn {
        /// Identity-provider user id.
        user_id: String,
        /// State of the preference lookup.
        tier: TierLookup,
    },
}

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    /// Tier the permissions were taken from; `None` when the gate failed
    /// closed.
    pub tier: Option<VisitorTier>,
    /// Consent the decision was made under.
    pub consent: ConsentSignal,
    /// Capabilities of `tier`, or none when failed closed.
    pub permissions: TierPermissions,
    /// Analytics may run: the tier allows it and consent is granted.
    pub analytics: bool,
    /// Session replay may run. Never set without `analytics`.
    pub session_replay: bool,
}
