//! Role-gated administration endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pslang_core::user::DEFAULT_ADMIN_LIMIT;
use pslang_domain::{AlphaSignup, Feedback, IdentityUser, UserFilter, UserRole};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::context::AppContext;
use crate::error::ApiResult;

/// Upper bound on any admin page size.
const MAX_ADMIN_LIMIT: u32 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    limit: Option<u32>,
}

impl LimitQuery {
    fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_ADMIN_LIMIT).clamp(1, MAX_ADMIN_LIMIT)
    }
}

pub async fn list_users(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(actor): CurrentUser,
    filter: Result<Query<UserFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<IdentityUser>>> {
    let Query(mut filter) = filter?;
    filter.limit = Some(filter.limit.unwrap_or(DEFAULT_ADMIN_LIMIT).clamp(1, MAX_ADMIN_LIMIT));
    Ok(Json(ctx.admin.list_users(&actor, &filter).await?))
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    role: UserRole,
}

pub async fn set_role(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
    body: Result<Json<SetRoleRequest>, JsonRejection>,
) -> ApiResult<Json<IdentityUser>> {
    let Json(body) = body?;
    Ok(Json(ctx.admin.set_role(&actor, &user_id, body.role).await?))
}

pub async fn delete_user(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    ctx.admin.delete_user(&actor, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_feedback(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(actor): CurrentUser,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Feedback>>> {
    let Query(query) = query?;
    Ok(Json(ctx.admin.list_feedback(&actor, query.limit()).await?))
}

pub async fn list_alpha_signups(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(actor): CurrentUser,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<AlphaSignup>>> {
    let Query(query) = query?;
    Ok(Json(ctx.admin.list_alpha_signups(&actor, query.limit()).await?))
}
