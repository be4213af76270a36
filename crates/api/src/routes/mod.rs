//! HTTP routes.

mod account;
mod admin;
mod connectors;
mod consent;
mod health;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::context::AppContext;
use crate::utils::logging::log_request_outcome;

/// Build the application router.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let api = Router::new()
        .route("/consent/decision", get(consent::decision))
        .route("/preferences/tier", get(consent::get_tier).put(consent::set_tier))
        .route("/feedback", post(account::submit_feedback))
        .route("/newsletter", post(account::subscribe).delete(account::unsubscribe))
        .route("/alpha-signups", post(account::alpha_signup))
        .route("/account/export", get(account::export))
        .route("/connectors", get(connectors::list))
        .route("/connectors/{provider}", delete(connectors::disconnect))
        .route("/connectors/{provider}/authorize", get(connectors::authorize))
        .route("/connectors/{provider}/callback", get(connectors::callback))
        .route("/connectors/{provider}/sync", post(connectors::sync))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}", delete(admin::delete_user))
        .route("/admin/users/{id}/role", put(admin::set_role))
        .route("/admin/feedback", get(admin::list_feedback))
        .route("/admin/alpha-signups", get(admin::list_alpha_signups));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(middleware::from_fn(log_requests))
        .with_state(ctx)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    log_request_outcome(method.as_str(), &route, response.status().as_u16(), started.elapsed());
    response
}

