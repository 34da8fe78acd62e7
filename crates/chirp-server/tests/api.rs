use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use chirp_api::state::{AppState, AppStateInner};
use chirp_db::Database;
use chirp_server::router;

fn test_app(platform: &str) -> (Router, AppState) {
    let db = Database::open_in_memory().unwrap();
    let state = AppStateInner::new(db, "test-secret".to_string(), platform.to_string());
    let app = router(state.clone(), Path::new("missing-public-dir"));
    (app, state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri, bearer, body.map(|v| v.to_string())).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<String>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(text) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(text))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn register(app: &Router, email: &str, password: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/users",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn login(app: &Router, email: &str, password: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _) = test_app("dev");
    let (status, body) = send_raw(&app, "GET", "/api/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn register_omits_password_fields() {
    let (app, _) = test_app("dev");
    let user = register(&app, "walt@example.com", "123456").await;

    assert_eq!(user["email"], "walt@example.com");
    user["id"].as_str().unwrap().parse::<Uuid>().unwrap();
    assert!(user.get("password").is_none());
    assert!(user.get("hashed_password").is_none());
}

#[tokio::test]
async fn duplicate_email_surfaces_as_internal_error() {
    let (app, _) = test_app("dev");
    register(&app, "walt@example.com", "123456").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({"email": "walt@example.com", "password": "other"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn malformed_json_body_is_internal_error() {
    let (app, _) = test_app("dev");
    let (status, body) = send_raw(
        &app,
        "POST",
        "/api/users",
        None,
        Some("{not json".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Couldn't decode parameters");
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let (app, _) = test_app("dev");
    register(&app, "walt@example.com", "123456").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": "walt@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Incorrect email or password");

    let (status, body) = send(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Incorrect email or password");
}

#[tokio::test]
async fn chirp_end_to_end_is_masked_on_every_read() {
    let (app, _) = test_app("dev");
    register(&app, "walt@example.com", "123456").await;
    let session = login(&app, "walt@example.com", "123456").await;
    let token = session["token"].as_str().unwrap();

    let (status, chirp) = send(
        &app,
        "POST",
        "/api/chirps",
        Some(token),
        Some(json!({"body": "This is a sharbert sample"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(chirp["body"], "This is a **** sample");
    assert_eq!(chirp["user_id"], session["id"]);

    let id = chirp["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/api/chirps/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["body"], "This is a **** sample");

    let (status, listed) = send(&app, "GET", "/api/chirps", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["body"], "This is a **** sample");
}

#[tokio::test]
async fn attached_punctuation_is_not_masked() {
    let (app, _) = test_app("dev");
    register(&app, "walt@example.com", "123456").await;
    let session = login(&app, "walt@example.com", "123456").await;
    let token = session["token"].as_str().unwrap();

    let (status, chirp) = send(
        &app,
        "POST",
        "/api/chirps",
        Some(token),
        Some(json!({"body": "Sharbert's weekend was a kerfuffle"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(chirp["body"], "Sharbert's weekend was a ****");
}

#[tokio::test]
async fn overlong_chirp_rejected_and_not_persisted() {
    let (app, _) = test_app("dev");
    register(&app, "walt@example.com", "123456").await;
    let session = login(&app, "walt@example.com", "123456").await;
    let token = session["token"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/chirps",
        Some(token),
        Some(json!({"body": "a".repeat(141)})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Chirp is too long");

    let (_, listed) = send(&app, "GET", "/api/chirps", None, None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn chirp_creation_requires_valid_token() {
    let (app, _) = test_app("dev");

    let (status, _) = send(
        &app,
        "POST",
        "/api/chirps",
        None,
        Some(json!({"body": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/chirps",
        Some("garbage-token"),
        Some(json!({"body": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chirp_lookup_failure_modes() {
    let (app, _) = test_app("dev");

    let (status, _) = send(&app, "GET", "/api/chirps/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let missing = Uuid::new_v4();
    let (status, _) = send(&app, "GET", &format!("/api/chirps/{}", missing), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_user_replaces_credentials() {
    let (app, _) = test_app("dev");
    register(&app, "walt@example.com", "123456").await;
    let session = login(&app, "walt@example.com", "123456").await;
    let token = session["token"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        "PUT",
        "/api/users",
        Some(token),
        Some(json!({"email": "heisenberg@example.com", "password": "bluecrystal"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["email"], "heisenberg@example.com");

    // Old credentials are gone, new ones work.
    let (status, _) = send(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": "walt@example.com", "password": "123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    login(&app, "heisenberg@example.com", "bluecrystal").await;
}

#[tokio::test]
async fn update_user_requires_token() {
    let (app, _) = test_app("dev");
    let (status, _) = send(
        &app,
        "PUT",
        "/api/users",
        None,
        Some(json!({"email": "x@example.com", "password": "y"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_then_revoke_lifecycle() {
    let (app, _) = test_app("dev");
    register(&app, "walt@example.com", "123456").await;
    let session = login(&app, "walt@example.com", "123456").await;
    let refresh_token = session["refresh_token"].as_str().unwrap();

    let (status, body) = send(&app, "POST", "/api/refresh", Some(refresh_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let access = body["token"].as_str().unwrap();
    assert!(!access.is_empty());

    // The freshly minted access token is immediately usable.
    let (status, _) = send(
        &app,
        "POST",
        "/api/chirps",
        Some(access),
        Some(json!({"body": "minted via refresh"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", "/api/revoke", Some(refresh_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "POST", "/api/refresh", Some(refresh_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Refresh token is revoked");
}

#[tokio::test]
async fn unknown_refresh_token_rejected() {
    let (app, _) = test_app("dev");
    let (status, _) = send(&app, "POST", "/api/refresh", Some("deadbeef"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_refresh_token_rejected() {
    let (app, state) = test_app("dev");
    let user = register(&app, "walt@example.com", "123456").await;
    let user_id = user["id"].as_str().unwrap();

    state
        .db
        .create_refresh_token(
            "expired-token",
            "2020-01-01T00:00:00+00:00",
            "2020-01-01T00:00:00+00:00",
            user_id,
            "2020-03-01T00:00:00+00:00",
        )
        .unwrap();

    let (status, body) = send(&app, "POST", "/api/refresh", Some("expired-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Refresh token is expired");
}

#[tokio::test]
async fn admin_reset_deletes_users_even_when_forbidden() {
    // Documents inherited behavior: the purge is not gated by the platform
    // check, only the status code is.
    let (app, _) = test_app("prod");
    register(&app, "walt@example.com", "123456").await;

    let (status, _) = send(&app, "POST", "/admin/reset", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": "walt@example.com", "password": "123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_reset_succeeds_on_dev() {
    let (app, _) = test_app("dev");
    let (status, _) = send(&app, "POST", "/admin/reset", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_app_hits_are_all_counted() {
    let (app, _) = test_app("dev");
    const N: usize = 25;

    let mut handles = Vec::with_capacity(N);
    for i in 0..N {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            // Missing files still pass through the counting middleware.
            send_raw(&app, "GET", &format!("/app/file-{}.txt", i), None, None).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let (status, body) = send_raw(&app, "GET", "/admin/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains(&format!("visited {} times", N)), "{}", html);

    let (status, _) = send_raw(&app, "POST", "/admin/reset", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_raw(&app, "GET", "/admin/metrics", None, None).await;
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("visited 0 times"), "{}", html);
}
