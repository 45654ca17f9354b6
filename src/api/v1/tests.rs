//! Router-level tests: the real middleware stack over the in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::app::build_router;
use crate::config::Config;
use crate::repos::MemoryStore;
use crate::services::auth::TokenCodec;
use crate::state::AppState;

const SECRET: &str = "router-test-secret-router-test-secret";
const PASSWORD: &str = "Passw0rd!";

fn app_with_burst(burst: u32) -> (Router, AppState) {
    let config = Config::from_source(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        "STORAGE_BACKEND" => Some("memory".to_string()),
        "ADMISSION_BURST" => Some(burst.to_string()),
        // effectively no refill during a test
        "ADMISSION_RATE_PER_SEC" => Some("0.0001".to_string()),
        _ => None,
    })
    .unwrap();

    let store = Arc::new(MemoryStore::new());
    let state = AppState::assemble(
        store.clone(),
        store,
        TokenCodec::new(&config.jwt_secret, config.token_ttl_seconds),
        config.admission,
        config.storage_timeout,
    );

    (build_router(state.clone(), &config), state)
}

fn app() -> (Router, AppState) {
    app_with_burst(1_000)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registers `name` and returns `(user_id, token)`.
async fn register(app: &Router, name: &str) -> (Uuid, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/register",
        None,
        Some(json!({
            "user_name": name,
            "email": format!("{name}@example.com"),
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["token_type"], "Bearer");

    let user_id = body["user_id"].as_str().unwrap().parse().unwrap();
    (user_id, body["token"].as_str().unwrap().to_string())
}

async fn create_snippet(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/snippets",
        Some(token),
        Some(json!({"title": title, "language": "rust", "content": "fn main() {}"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["snippet_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_then_call_a_protected_route() {
    let (app, _) = app();
    let (_, token) = register(&app, "alice").await;

    let (status, body) = send(&app, Method::GET, "/api/v1/snippets", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn protected_route_without_credential_is_401() {
    let (app, _) = app();

    let (status, body) = send(&app, Method::GET, "/api/v1/snippets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn expired_token_is_401() {
    let (app, state) = app();
    let (user_id, _) = register(&app, "alice").await;

    let two_days_ago = chrono::Utc::now().timestamp() - 2 * 86_400;
    let stale = state.tokens.issue_at(user_id, two_days_ago).unwrap();

    let (status, _) = send(&app, Method::GET, "/api/v1/snippets", Some(&stale.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_from_another_secret_is_401() {
    let (app, _) = app();
    let (user_id, _) = register(&app, "alice").await;

    let forged = TokenCodec::new(b"some-other-secret-some-other-secret", 3600)
        .issue(user_id)
        .unwrap();

    let (status, _) = send(&app, Method::GET, "/api/v1/snippets", Some(&forged.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn other_tenant_cannot_tell_a_foreign_snippet_from_a_missing_one() {
    let (app, _) = app();
    let (_, alice) = register(&app, "alice").await;
    let (_, bob) = register(&app, "bob").await;
    let owned = create_snippet(&app, &alice, "secret").await;
    let missing = Uuid::new_v4().to_string();

    let update = json!({"title": "x", "language": "go", "content": "y"});
    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let body = (method == Method::PUT).then(|| update.clone());

        let foreign = send(
            &app,
            method.clone(),
            &format!("/api/v1/snippets/{owned}"),
            Some(&bob),
            body.clone(),
        )
        .await;
        let absent = send(
            &app,
            method.clone(),
            &format!("/api/v1/snippets/{missing}"),
            Some(&bob),
            body,
        )
        .await;

        assert_eq!(foreign.0, StatusCode::NOT_FOUND, "{method}");
        assert_eq!(foreign, absent, "{method}");
    }

    // untouched for the owner
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/snippets/{owned}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "secret");
}

#[tokio::test]
async fn listing_only_returns_the_callers_snippets() {
    let (app, _) = app();
    let (_, alice) = register(&app, "alice").await;
    let (_, bob) = register(&app, "bob").await;
    create_snippet(&app, &alice, "a1").await;
    create_snippet(&app, &alice, "a2").await;
    create_snippet(&app, &bob, "b1").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/snippets?sort=title&order=asc",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["a1", "a2"]);
}

#[tokio::test]
async fn invalid_sort_is_400() {
    let (app, _) = app();
    let (_, token) = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/snippets?sort=password_hash",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Sort options are invalid");
}

#[tokio::test]
async fn malformed_snippet_id_is_400() {
    let (app, _) = app();
    let (_, token) = register(&app, "alice").await;

    let (status, _) = send(&app, Method::GET, "/api/v1/snippets/42", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn owner_update_and_delete_round_trip() {
    let (app, _) = app();
    let (_, token) = register(&app, "alice").await;
    let id = create_snippet(&app, &token, "draft").await;
    let uri = format!("/api/v1/snippets/{id}");

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({"title": "final", "language": "go", "content": "package main"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "final");
    assert_eq!(body["language"], "go");

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["snippet_id"], id.as_str());

    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let (app, _) = app();
    register(&app, "alice").await;

    let wrong_password = send(
        &app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "Wr0ngPass!"})),
    )
    .await;
    let unknown_email = send(
        &app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": PASSWORD})),
    )
    .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({"email": "alice@example.com", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn weak_password_is_rejected_at_registration() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/register",
        None,
        Some(json!({"user_name": "alice", "email": "alice@example.com", "password": "password"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Password must contain at least one")
    );
}

#[tokio::test]
async fn duplicate_registration_is_409() {
    let (app, _) = app();
    register(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/register",
        None,
        Some(json!({"user_name": "alice", "email": "alice@example.com", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleting_the_account_removes_its_snippets() {
    let (app, _) = app();
    let (user_id, token) = register(&app, "alice").await;
    let id = create_snippet(&app, &token, "gone soon").await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/api/v1/account",
        None,
        Some(json!({"email": "alice@example.com", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user_id.to_string());

    // the token is still well-formed, but nothing is left behind it
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/snippets/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creating_a_snippet_after_deleting_the_account_is_401() {
    let (app, _) = app();
    let (_, token) = register(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/v1/account",
        None,
        Some(json!({"email": "alice@example.com", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/snippets",
        Some(&token),
        Some(json!({"title": "orphan", "language": "rust", "content": "fn main() {}"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn change_password_then_login_with_the_new_one() {
    let (app, _) = app();
    register(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/account/password",
        None,
        Some(json!({
            "email": "alice@example.com",
            "password": PASSWORD,
            "new_password": "N3wPassw0rd!",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "N3wPassw0rd!"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn sixth_request_in_a_burst_is_429_before_authentication() {
    let (app, _) = app_with_burst(5);

    for _ in 0..5 {
        let (status, _) = send(&app, Method::GET, "/api/v1/snippets", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/snippets", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "TOO_MANY_REQUESTS");
}

#[tokio::test]
async fn open_endpoints_share_the_admission_bucket() {
    let (app, _) = app_with_burst(5);
    let credentials = json!({"email": "nobody@example.com", "password": PASSWORD});

    for _ in 0..5 {
        let (status, _) = send(&app, Method::POST, "/api/v1/login", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = send(&app, Method::POST, "/api/v1/login", None, Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "TOO_MANY_REQUESTS");

    // same bucket for the protected routes
    let (status, _) = send(&app, Method::GET, "/api/v1/snippets", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn every_open_endpoint_is_admission_controlled() {
    let (app, _) = app_with_burst(1);
    let (status, _) = send(&app, Method::GET, "/api/v1/snippets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let register_body = json!({
        "user_name": "alice",
        "email": "alice@example.com",
        "password": PASSWORD,
    });
    let credentials = json!({"email": "alice@example.com", "password": PASSWORD});
    let change = json!({
        "email": "alice@example.com",
        "password": PASSWORD,
        "new_password": "N3wPassw0rd!",
    });

    for (method, uri, body) in [
        (Method::POST, "/api/v1/register", register_body),
        (Method::POST, "/api/v1/login", credentials.clone()),
        (Method::DELETE, "/api/v1/account", credentials),
        (Method::PUT, "/api/v1/account/password", change),
    ] {
        let (status, _) = send(&app, method, uri, None, Some(body)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS, "{uri}");
    }
}

#[tokio::test]
async fn health_does_not_consume_admission() {
    let (app, _) = app_with_burst(1);

    for _ in 0..3 {
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    let (status, _) = send(&app, Method::GET, "/api/v1/snippets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let (app, _) = app();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
}
