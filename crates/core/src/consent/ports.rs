//! Port interfaces for consent enforcement
//!
//! These traits define the boundaries between the tier gate and the
//! infrastructure that stores preferences and ships analytics events.

use async_trait::async_trait;
use pslang_domain::{Result, VisitorPreferences};
use serde::{Deserialize, Serialize};

/// Trait for persisted visitor preferences
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Get the preference record for a user, if one exists
    async fn get(&self, user_id: &str) -> Result<Option<VisitorPreferences>>;

    /// Insert or replace the preference record for `prefs.user_id`
    async fn upsert(&self, prefs: VisitorPreferences) -> Result<()>;

    /// Delete the preference record of a user (no-op when absent)
    async fn delete_for_user(&self, user_id: &str) -> Result<()>;
}

/// Analytics event data transfer object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// Event name (e.g., "consent_decision")
    pub event: String,
    /// Stable identifier of the visitor the event belongs to
    pub distinct_id: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl AnalyticsEvent {
    pub fn new(event: impl Into<String>, distinct_id: impl Into<String>) -> Self {
        Self { event: event.into(), distinct_id: distinct_id.into(), properties: Default::default() }
    }

    #[must_use]
    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// Analytics instrumentation for one visitor session.
///
/// Gate decisions are pushed into the client explicitly. `disable` is sticky:
/// it opts the session out and makes later consent signals ineffective until
/// `enable` is called by a fresh gate decision.
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    /// Full analytics including session replay
    fn enable(&self);

    /// Opt out of all capture
    fn disable(&self);

    /// Analytics on, session replay off
    fn disable_replay_only(&self);

    /// Capture an event. Dropped silently while opted out.
    async fn capture(&self, event: AnalyticsEvent) -> Result<()>;
}
