//! OAuth linking, sync and disconnect over HTTP.

mod support;

use axum::http::{Method, StatusCode};
use pslang_domain::{RawMessage, UserRole};
use support::{location, query_param, spawn_app, TestApp, PUBLIC_URL};

/// Run authorize + callback for `user_1` and return the callback redirect.
async fn link_anthropic(app: &TestApp, code: &str) -> String {
    let response =
        app.send(Method::GET, "/api/connectors/anthropic/authorize", Some("user_1"), None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let authorize_url = location(&response);
    assert!(authorize_url.starts_with("https://provider.test/authorize"));
    let state = query_param(&authorize_url, "state").expect("authorize url carries state");

    let response = app
        .send(
            Method::GET,
            &format!("/api/connectors/anthropic/callback?code={code}&state={state}"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    location(&response)
}

#[tokio::test(flavor = "multi_thread")]
async fn status_lists_every_provider() {
    let app = spawn_app();
    app.user("user_1", UserRole::User);

    let (status, body) = app.json(Method::GET, "/api/connectors", Some("user_1"), None).await;

    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["provider"], "anthropic");
    assert_eq!(list[0]["status"], "disconnected");
    assert_eq!(list[0]["configured"], true);
    assert_eq!(list[1]["provider"], "openai");
    assert_eq!(list[1]["configured"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn link_sync_and_disconnect() {
    let app = spawn_app();
    app.user("user_1", UserRole::User);

    let redirect = link_anthropic(&app, "abc").await;
    assert_eq!(redirect, format!("{PUBLIC_URL}/settings/connectors?connected=anthropic"));

    app.anthropic.put_conversation(
        "c1",
        "Roadmap",
        vec![RawMessage::new("user", "Plan the #roadmap"), RawMessage::new("assistant", "Sure")],
    );
    app.anthropic.put_conversation("c2", "Broken", vec![RawMessage::new("user", "hi")]);
    app.anthropic.fail_detail("c2");

    let (status, report) =
        app.json(Method::POST, "/api/connectors/anthropic/sync", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["provider"], "anthropic");
    assert_eq!(report["syncedCount"], 1);
    assert_eq!(report["failedCount"], 1);

    let (_, list) = app.json(Method::GET, "/api/connectors", Some("user_1"), None).await;
    assert_eq!(list[0]["status"], "connected");
    assert!(list[0]["lastSyncAt"].is_string());

    let (_, export) = app.json(Method::GET, "/api/account/export", Some("user_1"), None).await;
    let conversations = export["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["externalConversationId"], "c1");
    assert!(!export.to_string().contains("access-abc"), "tokens never leave the service");

    let (status, _) =
        app.json(Method::DELETE, "/api/connectors/anthropic", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = app.json(Method::GET, "/api/connectors", Some("user_1"), None).await;
    assert_eq!(list[0]["status"], "disconnected");

    let (status, body) =
        app.json(Method::POST, "/api/connectors/anthropic/sync", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "not_connected");
}

#[tokio::test(flavor = "multi_thread")]
async fn callback_denial_and_exchange_failure_redirect_with_error_codes() {
    let app = spawn_app();
    app.user("user_1", UserRole::User);

    let response = app
        .send(Method::GET, "/api/connectors/anthropic/callback?error=access_denied", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert_eq!(query_param(&target, "error").as_deref(), Some("access_denied"));
    assert_eq!(query_param(&target, "provider").as_deref(), Some("anthropic"));

    let redirect = link_anthropic(&app, "bad-code").await;
    assert_eq!(query_param(&redirect, "error").as_deref(), Some("token_exchange_error"));

    // None of the failures stored a credential.
    let (_, list) = app.json(Method::GET, "/api/connectors", Some("user_1"), None).await;
    assert_eq!(list[0]["status"], "disconnected");
}

#[tokio::test(flavor = "multi_thread")]
async fn callback_with_missing_or_forged_parameters_is_bad_request() {
    let app = spawn_app();
    app.user("user_1", UserRole::User);

    for uri in [
        "/api/connectors/anthropic/callback?state=abc",
        "/api/connectors/anthropic/callback?code=abc",
        "/api/connectors/anthropic/callback",
        "/api/connectors/anthropic/callback?code=abc&state=forged",
    ] {
        let (status, body) = app.json(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "bad_request", "{uri}");
    }

    let (_, list) = app.json(Method::GET, "/api/connectors", Some("user_1"), None).await;
    assert_eq!(list[0]["status"], "disconnected");
}

#[tokio::test(flavor = "multi_thread")]
async fn authorize_rejects_unknown_and_unconfigured_providers() {
    let app = spawn_app();
    app.user("user_1", UserRole::User);

    let (status, _) =
        app.json(Method::GET, "/api/connectors/bard/authorize", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) =
        app.json(Method::GET, "/api/connectors/openai/authorize", Some("user_1"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "configuration_error");

    let (status, _) = app.json(Method::GET, "/api/connectors/anthropic/authorize", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
