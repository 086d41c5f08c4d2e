mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_listing_crud_by_host() {
    let app = TestApp::new().await;
    let (host_id, host) = app.sign_up("hosty", "h@x.com").await;

    let res = app.request("POST", "/api/v1/listings", Some(&host), Some(json!({
        "title": "Lake Cabin",
        "description": "Quiet place by the water",
        "location": "Lakeside",
        "price_per_night": 120.0,
        "host_id": "someone-else"
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let listing = parse_body(res).await;
    assert_eq!(listing["host_id"], host_id);
    let listing_id = listing["id"].as_str().unwrap().to_string();

    // Listings are readable without logging in
    let res = app.request("GET", "/api/v1/listings", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let all = parse_body(res).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/listings/{}", listing_id);
    let res = app.request("PATCH", &uri, Some(&host), Some(json!({"title": "Lake Cabin Deluxe"}))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = parse_body(res).await;
    assert_eq!(updated["title"], "Lake Cabin Deluxe");
    assert_eq!(updated["location"], "Lakeside");

    let res = app.request("PUT", &uri, Some(&host), Some(json!({
        "title": "Forest Hut",
        "price_per_night": 80.0
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let replaced = parse_body(res).await;
    assert_eq!(replaced["title"], "Forest Hut");
    assert_eq!(replaced["location"], "");

    let res = app.request("DELETE", &uri, Some(&host), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.request("GET", &uri, None, None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_host_can_modify_listing() {
    let app = TestApp::new().await;
    let (_, host) = app.sign_up("hosty", "h@x.com").await;
    let (_, other) = app.sign_up("other", "o@x.com").await;

    let res = app.request("POST", "/api/v1/listings", Some(&host), Some(json!({
        "title": "Lake Cabin",
        "price_per_night": 120.0
    }))).await;
    let listing_id = parse_body(res).await["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/listings/{}", listing_id);

    let res = app.request("PATCH", &uri, Some(&other), Some(json!({"title": "Mine now"}))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("DELETE", &uri, Some(&other), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("GET", &uri, None, None).await;
    assert_eq!(parse_body(res).await["title"], "Lake Cabin");
}

#[tokio::test]
async fn test_listing_write_requires_auth() {
    let app = TestApp::new().await;

    let res = app.request("POST", "/api/v1/listings", None, Some(json!({
        "title": "Lake Cabin",
        "price_per_night": 120.0
    }))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listing_validation() {
    let app = TestApp::new().await;
    let (_, host) = app.sign_up("hosty", "h@x.com").await;

    let res = app.request("POST", "/api/v1/listings", Some(&host), Some(json!({
        "title": "   ",
        "price_per_night": 120.0
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("POST", "/api/v1/listings", Some(&host), Some(json!({
        "title": "Lake Cabin",
        "price_per_night": -1.0
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
