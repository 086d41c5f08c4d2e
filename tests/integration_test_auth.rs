mod common;

use axum::http::{header, StatusCode};
use common::{parse_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let res = app.request("GET", "/health", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "ok");
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = TestApp::new().await;

    let res = app.request("POST", "/api/v1/auth/register", None, Some(json!({
        "username": "guesty",
        "email": "G@X.com",
        "password": "correct-horse"
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;
    assert_eq!(body["email"], "g@x.com");
    assert!(body.get("password_hash").is_none());

    let auth = app.login("guesty", "correct-horse").await;
    assert!(!auth.csrf_token.is_empty());

    let res = app.request("POST", "/api/v1/auth/logout", Some(&auth), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("access_token="));
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = TestApp::new().await;
    app.sign_up("guesty", "g@x.com").await;

    let res = app.request("POST", "/api/v1/auth/register", None, Some(json!({
        "username": "guesty",
        "email": "other@x.com",
        "password": "correct-horse"
    }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = TestApp::new().await;
    app.sign_up("guesty", "g@x.com").await;

    let res = app.request("POST", "/api/v1/auth/login", None, Some(json!({
        "username": "guesty",
        "password": "wrong-horse"
    }))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_short_password_is_rejected() {
    let app = TestApp::new().await;

    let res = app.request("POST", "/api/v1/auth/register", None, Some(json!({
        "username": "guesty",
        "email": "g@x.com",
        "password": "short"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
