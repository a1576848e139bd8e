use axum::http::StatusCode;
use serde_json::json;

mod support;

#[tokio::test]
async fn update_password_verifies_the_current_password() {
    let (router, _pool) = support::test_app().await;
    let (_, body) = support::signup(&router, "a@x.com", "secret1", "Ada Lovelace").await;
    let access_token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let response = support::put_json_authed(
        &router,
        "/api/update-password",
        &access_token,
        json!({"currentPassword": "wrong-password", "newPassword": "secret2"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = support::put_json_authed(
        &router,
        "/api/update-password",
        &access_token,
        json!({"currentPassword": "secret1", "newPassword": "secret2"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works, new one does.
    let old_login = support::post_json(
        &router,
        "/api/login",
        json!({"email": "a@x.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(old_login.status(), StatusCode::UNAUTHORIZED);

    let new_login = support::post_json(
        &router,
        "/api/login",
        json!({"email": "a@x.com", "password": "secret2"}),
    )
    .await;
    assert_eq!(new_login.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_password_rejects_weak_replacements() {
    let (router, _pool) = support::test_app().await;
    let (_, body) = support::signup(&router, "a@x.com", "secret1", "Ada Lovelace").await;
    let access_token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let response = support::put_json_authed(
        &router,
        "/api/update-password",
        &access_token,
        json!({"currentPassword": "secret1", "newPassword": "tiny"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = support::body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn update_password_keeps_other_sessions_valid() {
    let (router, _pool) = support::test_app().await;
    let (_, body) = support::signup(&router, "a@x.com", "secret1", "Ada Lovelace").await;
    let access_token = body["data"]["accessToken"].as_str().unwrap().to_string();
    let refresh_token = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let response = support::put_json_authed(
        &router,
        "/api/update-password",
        &access_token,
        json!({"currentPassword": "secret1", "newPassword": "secret2"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Existing refresh tokens survive a password change.
    let refresh = support::post_json(
        &router,
        "/api/refresh",
        json!({"refreshToken": refresh_token}),
    )
    .await;
    assert_eq!(refresh.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_password_requires_authentication() {
    let (router, _pool) = support::test_app().await;

    let response = support::post_json(
        &router,
        "/api/update-password",
        json!({"currentPassword": "secret1", "newPassword": "secret2"}),
    )
    .await;
    // POST to a PUT-only route is a 405; the real check is the PUT below.
    assert_ne!(response.status(), StatusCode::OK);

    let request = axum::http::Request::builder()
        .method("PUT")
        .uri("/api/update-password")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            json!({"currentPassword": "secret1", "newPassword": "secret2"}).to_string(),
        ))
        .unwrap();
    let response = tower::ServiceExt::oneshot(router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reset_password_never_reveals_account_existence() {
    let (router, _pool) = support::test_app().await;
    support::signup(&router, "a@x.com", "secret1", "Ada Lovelace").await;

    let known = support::post_json(
        &router,
        "/api/reset-password",
        json!({"email": "a@x.com"}),
    )
    .await;
    assert_eq!(known.status(), StatusCode::OK);
    let known = support::body_json(known).await;

    let unknown = support::post_json(
        &router,
        "/api/reset-password",
        json!({"email": "nobody@x.com"}),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::OK);
    let unknown = support::body_json(unknown).await;

    assert_eq!(known, unknown);
}
