//! Feedback, newsletter, alpha signups and data export.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pslang_domain::{
    AccountExport, AlphaSignup, Feedback, NewAlphaSignup, NewFeedback, NewsletterSubscription,
};
use serde::Deserialize;

use crate::auth::{CurrentUser, MaybeUser};
use crate::context::AppContext;
use crate::error::ApiResult;

pub async fn submit_feedback(
    State(ctx): State<Arc<AppContext>>,
    user: MaybeUser,
    body: Result<Json<NewFeedback>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Feedback>)> {
    let Json(body) = body?;
    let feedback = ctx.accounts.submit_feedback(user.user(), body).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

#[derive(Debug, Deserialize)]
pub struct NewsletterRequest {
    email: String,
}

pub async fn subscribe(
    State(ctx): State<Arc<AppContext>>,
    body: Result<Json<NewsletterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<NewsletterSubscription>)> {
    let Json(body) = body?;
    let subscription = ctx.accounts.subscribe(&body.email).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn unsubscribe(
    State(ctx): State<Arc<AppContext>>,
    body: Result<Json<NewsletterRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = body?;
    ctx.accounts.unsubscribe(&body.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn alpha_signup(
    State(ctx): State<Arc<AppContext>>,
    user: MaybeUser,
    body: Result<Json<NewAlphaSignup>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AlphaSignup>)> {
    let Json(body) = body?;
    let signup = ctx.accounts.alpha_signup(user.user(), body).await?;
    Ok((StatusCode::CREATED, Json(signup)))
}

pub async fn export(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<AccountExport>> {
    Ok(Json(ctx.accounts.export(&user).await?))
}
