//! In-process router tests.
//!
//! The pool is lazy and never connects: every request here is decided by
//! authentication, authorization or validation before any query runs.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use biblioteca_server::{
    api,
    config::AppConfig,
    models::user::{Role, UserClaims},
    repository::Repository,
    services::Services,
    AppState,
};

fn app() -> (Router, AppConfig) {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");

    let services = Services::new(Repository::new(pool), &config);
    let state = AppState {
        config: Arc::new(config.clone()),
        services: Arc::new(services),
    };

    (api::router(state), config)
}

fn token(config: &AppConfig, user_id: i32, role: Role) -> String {
    UserClaims::new(user_id, "alumno@tectijuana.edu.mx", role, Duration::hours(1))
        .create_token(&config.auth.jwt_secret)
        .expect("token")
}

fn json_request(method: Method, uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = app();

    let response = app.oneshot(get_request("/api/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _) = app();

    let response = app
        .oneshot(get_request("/api-docs/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/loans/calculate-fine"].is_object());
}

#[tokio::test]
async fn test_create_loan_requires_token() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/loans",
            None,
            json!({ "bookId": 1, "userId": 1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let (app, _) = app();

    let response = app
        .oneshot(get_request("/api/loans/user", Some("not-a-jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let (app, _) = app();
    let forged = UserClaims::new(1, "x@tectijuana.edu.mx", Role::Admin, Duration::hours(1))
        .create_token("some-other-secret")
        .unwrap();

    let response = app
        .oneshot(get_request("/api/stats", Some(&forged)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_loans_requires_admin() {
    let (app, config) = app();
    let user = token(&config, 6, Role::User);

    let response = app
        .oneshot(get_request("/api/loans", Some(&user)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn test_stats_requires_admin() {
    let (app, config) = app();
    let user = token(&config, 6, Role::User);

    let response = app
        .oneshot(get_request("/api/stats", Some(&user)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_book_requires_admin() {
    let (app, config) = app();
    let user = token(&config, 6, Role::User);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/books",
            Some(&user),
            json!({ "catalogCode": "QA76.73 R87", "title": "Rust", "unit": 1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_loan_for_other_user_forbidden() {
    let (app, config) = app();
    let user = token(&config, 6, Role::User);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/loans",
            Some(&user),
            json!({ "bookId": 1, "userId": 5, "fechaDevolucion": "2030-01-01" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_other_users_loans_forbidden() {
    let (app, config) = app();
    let user = token(&config, 6, Role::User);

    let response = app
        .oneshot(get_request("/api/users/5/loans", Some(&user)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_other_users_entries_forbidden() {
    let (app, config) = app();
    let user = token(&config, 6, Role::User);

    let response = app
        .oneshot(get_request("/api/entries?userId=5", Some(&user)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_rejects_foreign_domain() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/users/register",
            None,
            json!({ "name": "Ana", "email": "ana@gmail.com", "password": "secreto123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_missing_fields() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/users/register",
            None,
            json!({ "email": "ana@tectijuana.edu.mx" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], 7);
}

#[tokio::test]
async fn test_session_cookie_accepted() {
    let (app, config) = app();
    let user = token(&config, 6, Role::User);

    let request = Request::builder()
        .uri("/api/stats")
        .header(header::COOKIE, format!("{}={}", config.auth.cookie_name, user))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // authenticated through the cookie, then refused as non-admin
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_loan_body_is_json_error() {
    let (app, config) = app();
    let user = token(&config, 6, Role::User);

    let response = app
        .oneshot(json_request(Method::POST, "/api/loans", Some(&user), json!({ "bookId": 1 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], 7);
    assert!(body["message"].as_str().unwrap().contains("userId"));
}

#[tokio::test]
async fn test_non_numeric_id_is_json_error() {
    let (app, _) = app();

    let response = app.oneshot(get_request("/api/books/abc", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_bad_query_string_is_json_error() {
    let (app, _) = app();

    let response = app.oneshot(get_request("/api/books?unit=x", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], 7);
}
