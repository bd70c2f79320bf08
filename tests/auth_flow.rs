//! End-to-end tests for the auth and user routes over the in-memory store.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use niltoum::{
    auth::{claims::TokenPayload, jwt::JwtKeys},
    build_app, AppConfig, AppState, JwtConfig,
};

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: None,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test".into(),
            audience: "test".into(),
            ttl_minutes: 5,
        },
    }
}

fn test_app() -> Router {
    build_app(AppState::in_memory(test_config()))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn registration(email: &str) -> Value {
    json!({
        "email": email,
        "password": "pw123456",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "headline": "First programmer"
    })
}

#[tokio::test]
async fn register_login_profile_roundtrip() {
    let app = test_app();

    let (status, reg) = send(&app, Method::POST, "/auth/register", None, Some(registration("a@x.com"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(reg["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    let user = &reg["user"];
    assert_eq!(user["email"], "a@x.com");
    assert_eq!(user["headline"], "First programmer");
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());
    let id = user["id"].as_str().unwrap().to_string();

    let (status, login) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "a@x.com", "password": "pw123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["id"], id.as_str());

    let token = login["access_token"].as_str().unwrap();
    let keys = JwtKeys::from_config(&test_config().jwt);
    let payload = keys.verify(token).unwrap();
    assert_eq!(payload.subject.as_str(), id);
    assert_eq!(payload.email, "a@x.com");

    let (status, profile) = send(&app, Method::GET, "/auth/profile", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&profile, user);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app();
    let (first, _) = send(&app, Method::POST, "/auth/register", None, Some(registration("dup@x.com"))).await;
    let (second, body) = send(&app, Method::POST, "/auth/register", None, Some(registration("dup@x.com"))).await;
    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "conflict");
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() {
    let app = test_app();

    let mut missing_last_name = registration("a@x.com");
    missing_last_name.as_object_mut().unwrap().remove("lastName");
    let (status, body) = send(&app, Method::POST, "/auth/register", None, Some(missing_last_name)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "validation_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("lastName"));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn padded_email_logs_in() {
    let app = test_app();
    let (status, _) = send(&app, Method::POST, "/auth/register", None, Some(registration(" a@x.com "))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, login) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": " a@x.com ", "password": "pw123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["email"], "a@x.com");
}

#[tokio::test]
async fn login_failures_share_one_response() {
    let app = test_app();
    send(&app, Method::POST, "/auth/register", None, Some(registration("a@x.com"))).await;

    let wrong_pw = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "a@x.com", "password": "wrong-password"})),
    )
    .await;
    let no_user = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "nobody@x.com", "password": "pw123456"})),
    )
    .await;

    assert_eq!(wrong_pw.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, no_user);
}

#[tokio::test]
async fn profile_requires_a_valid_token() {
    let app = test_app();

    let (missing, _) = send(&app, Method::GET, "/auth/profile", None, None).await;
    let (garbage, body) = send(&app, Method::GET, "/auth/profile", Some("not-a-token"), None).await;
    assert_eq!(missing, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Unauthorized");

    let other_keys = JwtKeys::from_config(&JwtConfig {
        secret: "another-secret".into(),
        ..test_config().jwt
    });
    let forged = other_keys
        .issue(&TokenPayload {
            subject: "507f1f77bcf86cd799439011".parse().unwrap(),
            email: "a@x.com".into(),
        })
        .unwrap();
    let (status, _) = send(&app, Method::GET, "/auth/profile", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_missing_user_is_rejected() {
    let app = test_app();
    let keys = JwtKeys::from_config(&test_config().jwt);
    let token = keys
        .issue(&TokenPayload {
            subject: "507f1f77bcf86cd799439011".parse().unwrap(),
            email: "ghost@x.com".into(),
        })
        .unwrap();

    let (status, _) = send(&app, Method::GET, "/auth/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_routes_validate_identifiers() {
    let app = test_app();
    let (_, reg) = send(&app, Method::POST, "/auth/register", None, Some(registration("a@x.com"))).await;
    let token = reg["access_token"].as_str().unwrap();
    let id = reg["user"]["id"].as_str().unwrap();

    let (status, body) = send(&app, Method::GET, "/users/123", Some(token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid ObjectId: 123");

    let (status, _) = send(&app, Method::GET, "/users/507f1f77bcf86cd799439011", Some(token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, found) = send(&app, Method::GET, &format!("/users/{id}"), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["email"], "a@x.com");

    let (status, list) = send(&app, Method::GET, "/users", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn guard_runs_before_identifier_validation() {
    let app = test_app();
    let (status, _) = send(&app, Method::GET, "/users/123", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_routes_are_open() {
    let app = test_app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
