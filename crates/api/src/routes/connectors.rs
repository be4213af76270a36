//! Chat-provider connectors: status, OAuth linking, sync and disconnect.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use pslang_core::connectors::error_redirect;
use pslang_core::CallbackParams;
use pslang_domain::{ChatProvider, ConnectorSummary, PsLangError, SyncReport};
use tracing::warn;

use crate::auth::CurrentUser;
use crate::context::AppContext;
use crate::error::ApiResult;

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<ConnectorSummary>>> {
    Ok(Json(ctx.linker.status(&user.id).await?))
}

/// Send the browser to the provider's consent screen.
pub async fn authorize(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(provider): Path<String>,
) -> ApiResult<Redirect> {
    let provider: ChatProvider = provider.parse()?;
    let url = ctx.linker.authorize(&user.id, provider)?;
    Ok(Redirect::to(&url))
}

/// Provider redirect target.
///
/// Missing parameters or a bad state token are a 400. Every other outcome
/// ends in a redirect to the connector settings page, error-tagged on failure.
pub async fn callback(
    State(ctx): State<Arc<AppContext>>,
    Path(provider): Path<String>,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> ApiResult<Redirect> {
    let provider: ChatProvider = provider.parse()?;
    let params = params.map_or_else(|_| CallbackParams::default(), |Query(p)| p);

    let target = match ctx.linker.callback(provider, params).await {
        Ok(outcome) => outcome.redirect_url(ctx.public_url()),
        Err(err @ PsLangError::BadRequest(_)) => return Err(err.into()),
        Err(err) => {
            warn!(%provider, code = err.code(), error = %err, "connector callback failed");
            error_redirect(ctx.public_url(), provider, err.code())
        }
    };
    Ok(Redirect::to(&target))
}

pub async fn sync(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(provider): Path<String>,
) -> ApiResult<Json<SyncReport>> {
    let provider: ChatProvider = provider.parse()?;
    Ok(Json(ctx.sync.sync(&user.id, provider).await?))
}

pub async fn disconnect(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Path(provider): Path<String>,
) -> ApiResult<StatusCode> {
    let provider: ChatProvider = provider.parse()?;
    ctx.linker.disconnect(&user.id, provider).await?;
    Ok(StatusCode::NO_CONTENT)
}
