//! Live API tests against a running server
//!
//! Start the server with a fresh database, then run
//! `cargo test --test live_api -- --ignored`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8000";

/// Usernames must be unique per database, so suffix them per run
fn unique(name: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}{}", name, nanos)
}

/// Helper to register a user and get a token for it
async fn get_auth_token(client: &Client) -> String {
    let username = unique("user");
    client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({ "username": username, "password": "pw123" }))
        .send()
        .await
        .expect("Failed to send register request");

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .form(&[("username", username.as_str()), ("password", "pw123")])
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["access_token"]
        .as_str()
        .expect("No token in response")
        .to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .form(&[("username", unique("ghost").as_str()), ("password", "wrong")])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["www-authenticate"], "Bearer");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_registration() {
    let client = Client::new();
    let username = unique("dup");

    let register = |password: &'static str| {
        client
            .post(format!("{}/auth/register", BASE_URL))
            .json(&json!({ "username": username, "password": password }))
            .send()
    };

    let response = register("first").await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = register("second").await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "UsernameTaken");

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .form(&[("username", username.as_str()), ("password", "first")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_registration_has_one_winner() {
    let client = Client::new();
    let username = unique("race");

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let request = client
                .post(format!("{}/auth/register", BASE_URL))
                .json(&json!({ "username": username, "password": "pw" }));
            tokio::spawn(request.send())
        })
        .collect();

    let mut created = 0;
    for attempt in attempts {
        let response = attempt
            .await
            .expect("Task panicked")
            .expect("Failed to send request");
        match response.status() {
            StatusCode::OK => created += 1,
            StatusCode::BAD_REQUEST => {
                let body: Value = response.json().await.expect("Failed to parse response");
                assert_eq!(body["error"], "UsernameTaken");
            }
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let barcode = unique("B");

    let info: Value = client
        .post(format!("{}/catalog", BASE_URL))
        .json(&json!({
            "isbn": unique("978").chars().take(20).collect::<String>(),
            "title": "Live Test Book",
            "author": "Tester",
            "publisher": "Test Press",
            "price": 1.0
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let response = client
        .post(format!("{}/inventory", BASE_URL))
        .json(&json!({ "barcode": barcode, "info_id": info["id"] }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/circulation/borrow", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "barcode": barcode }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let item: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(item["status"], "borrowed");

    let response = client
        .post(format!("{}/circulation/borrow", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "barcode": barcode }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/circulation/return", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "barcode": barcode }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    // Returning again is accepted and leaves the copy available
    let response = client
        .post(format!("{}/circulation/return", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "barcode": barcode }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let item: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(item["status"], "available");

    let response = client
        .post(format!("{}/circulation/borrow", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "barcode": unique("missing") }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .post(format!("{}/circulation/borrow", BASE_URL))
        .json(&json!({ "barcode": "B1" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
