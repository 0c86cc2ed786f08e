//! Smoke tests against a running server
//!
//! Start the server with `LIBRARY_AUTH__ALLOW_LIBRARIAN_SIGNUP=true`, then
//! run `cargo test --test integration -- --ignored`.

use std::collections::HashSet;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use library_orders::{
    config::AppConfig,
    models::user::{Role, UserClaims},
};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Register a fresh account with the given role and return its token
async fn signup_and_login(client: &Client, role: &str) -> String {
    let username = format!("{}-{}", role, &Uuid::new_v4().simple().to_string()[..8]);
    let password = "smoke-test-password";

    let response = client
        .post(format!("{}/users/signup", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password,
            "role": role
        }))
        .send()
        .await
        .expect("Failed to send signup request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// ISBN-13 shaped value unique per run
fn unique_isbn() -> String {
    let digits: String = Uuid::new_v4()
        .as_u128()
        .to_string()
        .chars()
        .take(10)
        .collect();
    format!("978{}", digits)
}

/// Add a book with `copies` copies and return its id
async fn create_book(client: &Client, librarian: &str, copies: u32) -> String {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(librarian)
        .json(&json!({
            "title": "Concurrency Smoke Book",
            "author": "Integration Suite",
            "isbn": unique_isbn(),
            "num_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let book: Value = response.json().await.expect("Failed to parse response");
    book["book_id"].as_str().expect("No book_id").to_string()
}

async fn available_copies(client: &Client, token: &str, book_id: &str) -> i64 {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");
    let book: Value = response.json().await.expect("Failed to parse response");
    book["available_copies"].as_i64().expect("No available_copies")
}

/// Fire one borrow order per token at the same time
async fn order_concurrently(
    client: &Client,
    tokens: Vec<String>,
    book_id: &str,
) -> Vec<(StatusCode, Value)> {
    let handles: Vec<_> = tokens
        .into_iter()
        .map(|token| {
            let client = client.clone();
            let book_id = book_id.to_string();
            tokio::spawn(async move {
                let response = client
                    .post(format!("{}/orders", BASE_URL))
                    .bearer_auth(&token)
                    .json(&json!({"book_id": book_id, "order_type": "borrow"}))
                    .send()
                    .await
                    .expect("Failed to send request");
                let status = response.status();
                let body: Value = response.json().await.expect("Failed to parse response");
                (status, body)
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("Order task panicked"));
    }
    results
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
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .json(&json!({
            "username": "nobody-here",
            "password": "wrong-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/orders/my_orders", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return() {
    let client = Client::new();
    let librarian = signup_and_login(&client, "librarian").await;
    let reader = signup_and_login(&client, "reader").await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&librarian)
        .json(&json!({
            "title": "Smoke Test Book",
            "author": "Integration Suite",
            "isbn": unique_isbn(),
            "num_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Failed to parse response");
    let book_id = book["book_id"].as_str().expect("No book_id").to_string();

    let response = client
        .post(format!("{}/orders", BASE_URL))
        .bearer_auth(&reader)
        .json(&json!({"book_id": book_id, "order_type": "borrow"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let order: Value = response.json().await.expect("Failed to parse response");
    let order_id = order["order_id"].as_str().expect("No order_id").to_string();

    // The only copy is out
    let response = client
        .post(format!("{}/orders", BASE_URL))
        .bearer_auth(&reader)
        .json(&json!({"book_id": book_id, "order_type": "read_in_library"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .put(format!("{}/orders/{}?status=completed", BASE_URL, order_id))
        .bearer_auth(&librarian)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    let book: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(book["available_copies"], 1);
}

#[tokio::test]
#[ignore]
async fn test_list_orders_requires_librarian() {
    let client = Client::new();
    let reader = signup_and_login(&client, "reader").await;

    let response = client
        .get(format!("{}/orders", BASE_URL))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_orders_for_last_copy() {
    let client = Client::new();
    let librarian = signup_and_login(&client, "librarian").await;
    let book_id = create_book(&client, &librarian, 1).await;

    let mut readers = Vec::new();
    for _ in 0..8 {
        readers.push(signup_and_login(&client, "reader").await);
    }

    let results = order_concurrently(&client, readers, &book_id).await;

    let created = results
        .iter()
        .filter(|(status, _)| *status == StatusCode::CREATED)
        .count();
    assert_eq!(created, 1);
    assert!(results
        .iter()
        .all(|(status, _)| *status == StatusCode::CREATED || *status == StatusCode::NOT_FOUND));
    assert_eq!(available_copies(&client, &librarian, &book_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_orders_take_distinct_copies() {
    let client = Client::new();
    let librarian = signup_and_login(&client, "librarian").await;
    let book_id = create_book(&client, &librarian, 2).await;

    let mut readers = Vec::new();
    for _ in 0..3 {
        readers.push(signup_and_login(&client, "reader").await);
    }

    let results = order_concurrently(&client, readers, &book_id).await;

    let copies: HashSet<String> = results
        .iter()
        .filter(|(status, _)| *status == StatusCode::CREATED)
        .map(|(_, body)| body["copy_id"].as_str().expect("No copy_id").to_string())
        .collect();
    let rejected = results
        .iter()
        .filter(|(status, _)| *status == StatusCode::NOT_FOUND)
        .count();

    assert_eq!(copies.len(), 2);
    assert_eq!(rejected, 1);
}

#[tokio::test]
#[ignore]
async fn test_rejected_order_insert_keeps_copy_available() {
    let client = Client::new();
    let librarian = signup_and_login(&client, "librarian").await;
    let book_id = create_book(&client, &librarian, 1).await;

    // Valid token for an account the orders table cannot reference
    let secret =
        std::env::var("JWT_SECRET").unwrap_or_else(|_| AppConfig::default().auth.jwt_secret);
    let now = Utc::now().timestamp();
    let ghost = UserClaims {
        sub: "ghost-reader".to_string(),
        user_id: Uuid::new_v4(),
        role: Role::Reader,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to sign token");

    let response = client
        .post(format!("{}/orders", BASE_URL))
        .bearer_auth(&ghost)
        .json(&json!({"book_id": book_id, "order_type": "borrow"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(available_copies(&client, &librarian, &book_id).await, 1);

    let reader = signup_and_login(&client, "reader").await;
    let response = client
        .post(format!("{}/orders", BASE_URL))
        .bearer_auth(&reader)
        .json(&json!({"book_id": book_id, "order_type": "borrow"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
}
