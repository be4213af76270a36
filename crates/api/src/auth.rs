//! Session authentication extractors.
//!
//! The session token is read from `Authorization: Bearer <token>`, falling
//! back to the `__session` cookie set by the identity provider's frontend,
//! and resolved through the identity provider on every request.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use pslang_domain::{IdentityUser, PsLangError};

use crate::context::AppContext;
use crate::error::ApiError;

/// A signed-in user. Rejects with 401 when no valid session is presented.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub IdentityUser);

/// An optional signed-in user.
///
/// A request without credentials is anonymous; a request with a token the
/// identity provider rejects is still a 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<IdentityUser>);

impl MaybeUser {
    pub fn user(&self) -> Option<&IdentityUser> {
        self.0.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

const SESSION_COOKIE: &str = "__session";

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn session_cookie(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|t| !t.is_empty())
}

fn session_token(parts: &Parts) -> Option<&str> {
    bearer_token(parts).or_else(|| session_cookie(parts))
}

impl FromRequestParts<Arc<AppContext>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts)
            .ok_or_else(|| PsLangError::Unauthorized("sign in required".into()))?;
        let user = ctx.identity.current_user(token).await?;
        Ok(Self(user))
    }
}

impl FromRequestParts<Arc<AppContext>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        match session_token(parts) {
            Some(token) => Ok(Self(Some(ctx.identity.current_user(token).await?))),
            None => Ok(Self(None)),
        }
    }
}
