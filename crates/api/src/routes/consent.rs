//! Tier gate decisions and tier preferences.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use pslang_core::{enforce, AnalyticsEvent, Enforcement};
use pslang_domain::{
    ConsentSignal, GateDecision, TierPermissions, VisitorPreferences, VisitorTier,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{CurrentUser, MaybeUser};
use crate::context::AppContext;
use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct DecisionQuery {
    consent: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    #[serde(flatten)]
    decision: GateDecision,
    enforcement: Enforcement,
}

/// Evaluate the gate for the caller and push it into a session analytics
/// client. A missing consent value counts as denied.
pub async fn decision(
    State(ctx): State<Arc<AppContext>>,
    user: MaybeUser,
    query: Result<Query<DecisionQuery>, QueryRejection>,
) -> ApiResult<Json<DecisionResponse>> {
    let Query(query) = query?;
    let consent = match query.consent.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => raw.parse()?,
        None => ConsentSignal::Denied,
    };

    let decision = ctx.tier_gate.decide(user.id(), consent).await;
    let analytics = ctx.analytics_session();
    let enforcement = enforce(&decision, analytics.as_ref());

    if decision.analytics {
        let event = AnalyticsEvent::new("consent_decision", user.id().unwrap_or("anonymous"))
            .with_property("tier", decision.tier.map(VisitorTier::as_str))
            .with_property("session_replay", decision.session_replay);
        if let Err(err) = analytics.capture(event).await {
            warn!(error = %err, "analytics capture failed");
        }
    }

    Ok(Json(DecisionResponse { decision, enforcement }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierResponse {
    tier: Option<VisitorTier>,
    permissions: TierPermissions,
    updated_at: Option<DateTime<Utc>>,
}

impl From<Option<VisitorPreferences>> for TierResponse {
    fn from(prefs: Option<VisitorPreferences>) -> Self {
        match prefs {
            Some(prefs) => Self {
                tier: Some(prefs.tier),
                permissions: prefs.tier.permissions(),
                updated_at: Some(prefs.updated_at),
            },
            None => Self { tier: None, permissions: TierPermissions::none(), updated_at: None },
        }
    }
}

pub async fn get_tier(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<TierResponse>> {
    let prefs = ctx.tier_gate.preferences(&user.id).await?;
    Ok(Json(prefs.into()))
}

#[derive(Debug, Deserialize)]
pub struct SetTierRequest {
    tier: VisitorTier,
}

pub async fn set_tier(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<SetTierRequest>, JsonRejection>,
) -> ApiResult<Json<TierResponse>> {
    let Json(body) = body?;
    let prefs = ctx.tier_gate.set_tier(&user.id, body.tier).await?;
    Ok(Json(Some(prefs).into()))
}
