//! Health check types reported by `GET /health`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Overall health status of the service
///
/// # Example
/// ```
/// use pslang_api::utils::health::{ComponentHealth, HealthStatus};
///
/// let mut status = HealthStatus::new()
///     .add_component(ComponentHealth::healthy("database"))
///     .add_component(ComponentHealth::unhealthy("identity", "timeout"));
/// status.calculate_score();
///
/// assert_eq!(status.score, 0.5);
/// assert!(!status.is_healthy);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub is_healthy: bool,

    /// `healthy_components / total_components`, 1.0 with no components.
    pub score: f64,

    pub components: Vec<ComponentHealth>,

    /// Unix timestamp (seconds) of the check
    pub timestamp: i64,
}

impl HealthStatus {
    /// Healthy status with no components.
    pub fn new() -> Self {
        Self { is_healthy: true, score: 1.0, components: Vec::new(), timestamp: Utc::now().timestamp() }
    }

    #[must_use]
    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Recompute `score` and `is_healthy` (80% threshold) from the components.
    #[allow(clippy::cast_precision_loss)]
    pub fn calculate_score(&mut self) {
        if self.components.is_empty() {
            return;
        }

        let healthy_count = self.components.iter().filter(|c| c.is_healthy).count();
        self.score = healthy_count as f64 / self.components.len() as f64;
        self.is_healthy = self.score >= 0.8;
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Health status of an individual component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub name: String,
    pub is_healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }
}
