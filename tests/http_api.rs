//! HTTP tests driving the router in-process over the in-memory store

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use library_orders::{
    api::create_router,
    config::AppConfig,
    models::user::{NewUser, Role, UserClaims},
    repository::Repository,
    AppState,
};

struct TestApp {
    router: Router,
    repository: Repository,
    secret: String,
}

impl TestApp {
    fn new() -> Self {
        let config = AppConfig::default();
        let secret = config.auth.jwt_secret.clone();
        let repository = Repository::in_memory();
        let router = create_router(AppState::new(config, repository.clone()));
        Self {
            router,
            repository,
            secret,
        }
    }

    /// Insert a user and mint a token for them
    async fn token_for(&self, username: &str, role: Role) -> String {
        let user = self
            .repository
            .users
            .create(NewUser {
                user_id: Uuid::new_v4(),
                username: username.to_string(),
                password_hash: "unused".to_string(),
                email: None,
                role,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let now = Utc::now().timestamp();
        UserClaims {
            sub: user.username,
            user_id: user.user_id,
            role,
            exp: now + 3600,
            iat: now,
        }
        .create_token(&self.secret)
        .unwrap()
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create_book(&self, librarian: &str, isbn: &str, copies: u32) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/books",
                Some(librarian),
                Some(json!({
                    "title": "Parable of the Sower",
                    "author": "Octavia E. Butler",
                    "isbn": isbn,
                    "num_copies": copies,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["book_id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_endpoints_answer() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send(Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn signup_login_and_me() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/users/signup",
            None,
            Some(json!({"username": "alice", "password": "correct horse"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "reader");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/users/login",
            None,
            Some(json!({"username": "alice", "password": "correct horse"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.send(Method::GET, "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/users/login",
            None,
            Some(json!({"username": "alice", "password": "wrong password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn roles_guard_endpoints() {
    let app = TestApp::new();
    let reader = app.token_for("alice", Role::Reader).await;
    let librarian = app.token_for("libby", Role::Librarian).await;

    let (status, _) = app.send(Method::GET, "/api/v1/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::GET, "/api/v1/orders", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send(Method::GET, "/api/v1/orders", Some(&reader), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 3);

    let book_id = app.create_book(&librarian, "9780446675505", 1).await;
    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/orders",
            Some(&librarian),
            Some(json!({"book_id": book_id, "order_type": "borrow"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn order_lifecycle_over_http() {
    let app = TestApp::new();
    let alice = app.token_for("alice", Role::Reader).await;
    let bob = app.token_for("bob", Role::Reader).await;
    let librarian = app.token_for("libby", Role::Librarian).await;
    let book_id = app.create_book(&librarian, "9780446675505", 1).await;

    let (status, order) = app
        .send(
            Method::POST,
            "/api/v1/orders",
            Some(&alice),
            Some(json!({"book_id": book_id, "order_type": "borrow"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    assert!(order["due_date"].is_string());
    let order_id = order["order_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/orders",
            Some(&bob),
            Some(json!({"book_id": book_id, "order_type": "read_in_library"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6);

    let (status, page) = app
        .send(Method::GET, "/api/v1/orders/my_orders", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["orders"].as_array().unwrap().len(), 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["has_next"], false);

    let (status, page) = app
        .send(Method::GET, "/api/v1/orders/alice", Some(&librarian), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["orders"][0]["order_id"], order_id.as_str());

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/orders/{}?status=returned", order_id),
            Some(&librarian),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, order) = app
        .send(
            Method::PUT,
            &format!("/api/v1/orders/{}?status=completed", order_id),
            Some(&librarian),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "completed");
    assert!(order["return_date"].is_string());

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/orders/{}?status=pending", order_id),
            Some(&librarian),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 10);

    let (status, book) = app
        .send(Method::GET, &format!("/api/v1/books/{}", book_id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["available_copies"], 1);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/orders/{}?status=completed", Uuid::new_v4()),
            Some(&librarian),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_input_is_400() {
    let app = TestApp::new();
    let alice = app.token_for("alice", Role::Reader).await;
    let librarian = app.token_for("libby", Role::Librarian).await;
    let book_id = app.create_book(&librarian, "9780446675505", 1).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/orders",
            Some(&alice),
            Some(json!({"book_id": book_id, "order_type": "steal"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 8);

    let (status, _) = app
        .send(
            Method::GET,
            "/api/v1/orders/my_orders?offset=-1",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/orders/not-a-uuid?status=completed",
            Some(&librarian),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/v1/books/{}/copies", book_id),
            Some(&librarian),
            Some(json!({"count": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn copies_and_holds() {
    let app = TestApp::new();
    let alice = app.token_for("alice", Role::Reader).await;
    let librarian = app.token_for("libby", Role::Librarian).await;
    let book_id = app.create_book(&librarian, "9780446675505", 0).await;

    let (status, created) = app
        .send(
            Method::POST,
            &format!("/api/v1/books/{}/copies", book_id),
            Some(&librarian),
            Some(json!({"count": 2})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.as_array().unwrap().len(), 2);

    let copy_id = created[0]["copy_id"].as_str().unwrap().to_string();
    let (status, copy) = app
        .send(
            Method::PUT,
            &format!("/api/v1/copies/{}?status=reserved", copy_id),
            Some(&librarian),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(copy["status"], "reserved");

    let (status, available) = app
        .send(
            Method::GET,
            &format!("/api/v1/books/{}/copies", book_id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(available.as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/copies/{}?status=borrowed", copy_id),
            Some(&librarian),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/api/v1/books/{}/copies", Uuid::new_v4()),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn most_borrowed_lists_ordered_books() {
    let app = TestApp::new();
    let alice = app.token_for("alice", Role::Reader).await;
    let librarian = app.token_for("libby", Role::Librarian).await;
    let book_id = app.create_book(&librarian, "9780446675505", 2).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/orders",
            Some(&alice),
            Some(json!({"book_id": book_id, "order_type": "borrow"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, ranked) = app
        .send(
            Method::GET,
            "/api/v1/books/most-borrowed?limit=5&days=7",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ranked[0]["book_id"], book_id.as_str());
    assert_eq!(ranked[0]["order_count"], 1);
}
