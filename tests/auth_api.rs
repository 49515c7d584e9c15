// tests/auth_api.rs

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{PASSWORD, TestApp};
use pdms::users::RoleName;

#[tokio::test]
async fn test_login_returns_tokens_and_roles() {
    let app = TestApp::new().await;
    let id = app
        .create_user("dana@example.com", "Dana", &[RoleName::Director])
        .await;

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "dana@example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["userId"], id);
    assert_eq!(body["name"], "Dana");
    assert_eq!(body["roles"], json!(["DIRECTOR"]));
    assert!(body["accessToken"].as_str().unwrap().len() > 20);
    assert!(body["refreshToken"].as_str().unwrap().len() > 20);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new().await;
    app.create_user("dana@example.com", "Dana", &[]).await;

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "dana@example.com", "password": "Wrong0ne@" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);

    let (status, _) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_login_body_is_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post("/auth/login", None, json!({ "email": "x@example.com" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_refresh_requires_refresh_token() {
    let app = TestApp::new().await;
    app.create_user("dana@example.com", "Dana", &[]).await;

    let (_, login) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "dana@example.com", "password": PASSWORD }),
        )
        .await;

    let (status, body) = app
        .post(
            "/auth/refresh",
            None,
            json!({ "refreshToken": login["refreshToken"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "dana@example.com");

    // An access token is not accepted in place of a refresh token
    let (status, _) = app
        .post(
            "/auth/refresh",
            None,
            json!({ "refreshToken": login["accessToken"] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = TestApp::new().await;
    app.create_user("dana@example.com", "Dana", &[]).await;

    let (_, login) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "dana@example.com", "password": PASSWORD }),
        )
        .await;

    let refresh = login["refreshToken"].as_str().unwrap();
    let (status, _) = app.get("/projects", refresh).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "UNAUTHORIZED");

    let (status, _) = app.get("/projects", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_is_stateless() {
    let app = TestApp::new().await;
    let (_, token) = app.user("dana@example.com", &[]).await;

    let (status, body) = app.request("POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, _) = app.request("POST", "/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_of_deleted_user_is_rejected() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin().await;
    let (id, token) = app.user("gone@example.com", &[]).await;

    let (status, _) = app.delete(&format!("/api/users/{}", id), &admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/projects", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = app.request("GET", "/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
