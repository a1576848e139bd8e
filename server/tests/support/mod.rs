#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::ServiceExt;

use gatehouse_server::{app, config::Config, state::AppState};

/// Fresh in-memory database with the schema applied. One connection keeps
/// every query on the same in-memory instance.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");

    pool
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 7,
        bind_addr: "127.0.0.1:0".to_string(),
    }
}

pub async fn test_app() -> (Router, SqlitePool) {
    let pool = test_pool().await;
    let router = app(AppState::new(pool.clone(), test_config()));
    (router, pool)
}

pub async fn post_json(
    router: &Router,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");

    router.clone().oneshot(request).await.expect("send request")
}

pub async fn post_json_authed(
    router: &Router,
    uri: &str,
    access_token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
        .body(Body::from(body.to_string()))
        .expect("build request");

    router.clone().oneshot(request).await.expect("send request")
}

pub async fn put_json_authed(
    router: &Router,
    uri: &str,
    access_token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
        .body(Body::from(body.to_string()))
        .expect("build request");

    router.clone().oneshot(request).await.expect("send request")
}

pub async fn get_authed(router: &Router, uri: &str, access_token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
        .body(Body::empty())
        .expect("build request");

    router.clone().oneshot(request).await.expect("send request")
}

pub async fn get_plain(router: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");

    router.clone().oneshot(request).await.expect("send request")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json body")
}

/// Signs up a fresh account and returns `(status, envelope)`.
pub async fn signup(
    router: &Router,
    email: &str,
    password: &str,
    full_name: &str,
) -> (StatusCode, serde_json::Value) {
    let response = post_json(
        router,
        "/api/signup",
        serde_json::json!({
            "email": email,
            "password": password,
            "fullName": full_name
        }),
    )
    .await;

    let status = response.status();
    (status, body_json(response).await)
}

pub async fn count_users(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .expect("count users")
}

pub async fn count_refresh_tokens(pool: &SqlitePool, user_id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("count refresh tokens")
}

pub async fn count_active_refresh_tokens(pool: &SqlitePool, user_id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM refresh_tokens WHERE user_id = ? AND revoked_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .expect("count active refresh tokens")
}
