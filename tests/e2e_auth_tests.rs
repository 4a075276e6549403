//! End-to-end tests for authentication endpoints
//!
//! Tests login, logout, session resolution and the status endpoints.

mod common;

use common::{
    TestClient, TestServer, ADMIN_PASS, ADMIN_USER, TEST_PASS, TEST_USER, TRACK_COUNT,
    VIDEO_COUNT,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_login_with_valid_credentials() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(TEST_USER, TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(cookie.starts_with("session_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=86400"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"], json!({ "username": TEST_USER, "role": "user" }));
    assert_eq!(body["token"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_login_with_invalid_password() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(TEST_USER, "wrong_password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_nonexistent_user() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login("nonexistent_user", "password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_with_missing_fields() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login("", TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Username and password are required");
}

#[tokio::test]
async fn test_auth_status_follows_session() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client.auth_status().await.json().await.unwrap();
    assert_eq!(body, json!({ "authenticated": false }));

    client.login(ADMIN_USER, ADMIN_PASS).await;
    let body: Value = client.auth_status().await.json().await.unwrap();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"], json!({ "username": ADMIN_USER, "role": "admin" }));

    let response = client.logout().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = client.auth_status().await.json().await.unwrap();
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_bearer_token_authenticates() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client.login(TEST_USER, TEST_PASS).await.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_owned();

    let body: Value = client.auth_status_with_token(&token).await.json().await.unwrap();
    assert_eq!(body["user"]["username"], TEST_USER);

    let body: Value = client
        .auth_status_with_token("not-a-real-token")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client.login(TEST_USER, TEST_PASS).await.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_owned();

    client.logout().await;

    let body: Value = client.auth_status_with_token(&token).await.json().await.unwrap();
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.logout().await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let server = TestServer::spawn().await;
    let first = TestClient::authenticated(server.base_url.clone()).await;
    let second = TestClient::authenticated(server.base_url.clone()).await;

    first.logout().await;

    let body: Value = second.auth_status().await.json().await.unwrap();
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn test_status_endpoints() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client.health().await.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["message"], "SoundWave server is running");
    assert!(body["timestamp"].is_string());

    let body: Value = client.db_status().await.json().await.unwrap();
    assert_eq!(body["database"], "SQLite");
    assert_eq!(body["counts"]["tracks"], TRACK_COUNT);
    assert_eq!(body["counts"]["videos"], VIDEO_COUNT);

    let body: Value = client.home().await.json().await.unwrap();
    assert!(body["uptime"].is_string());
    assert!(body["user"].is_null());
}
