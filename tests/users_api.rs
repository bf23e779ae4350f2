//! End-to-end tests against the seeded application router

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use user_lifecycle_api::api::create_router;
use user_lifecycle_api::{create_app_state, AppConfig};

fn seeded_app() -> Router {
    create_router(create_app_state(&AppConfig::default()).unwrap())
}

fn empty_app() -> Router {
    let mut config = AppConfig::default();
    config.store.seed = false;
    create_router(create_app_state(&config).unwrap())
}

fn valid_user(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "Abc123!Ֆ",
        "dateOfBirth": "1995-03-04",
        "quantity": 1,
        "price": "9.99",
        "amount": 10
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

#[tokio::test]
async fn test_list_seeded_users() {
    let app = seeded_app();

    let (status, body) = send(&app, "GET", "/api/users", None).await;

    assert_eq!(status, StatusCode::OK);

    let usernames: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(usernames, vec!["john_doe", "jane_smith", "max_muster"]);
    assert!(body[0].get("password").is_none());
}

#[tokio::test]
async fn test_create_on_empty_store_assigns_first_id() {
    let app = empty_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header("content-type", "application/json")
        .body(Body::from(valid_user("new").to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/api/users/1");

    let (status, body) = send(&app, "GET", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "new");
    assert_eq!(body["dateOfBirth"], "1995-03-04");
}

#[tokio::test]
async fn test_create_after_seed_uses_next_id() {
    let app = seeded_app();

    let (status, body) = send(&app, "POST", "/api/users", Some(valid_user("newcomer"))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 4);
}

#[tokio::test]
async fn test_create_accepts_grouped_price() {
    let app = empty_app();

    let mut payload = valid_user("grouped");
    payload["price"] = json!("1,000.50");

    let (status, body) = send(&app, "POST", "/api/users", Some(payload)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["price"], "1,000.50");
}

#[tokio::test]
async fn test_create_duplicate_username() {
    let app = seeded_app();

    let (status, body) = send(&app, "POST", "/api/users", Some(valid_user("john_doe"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "There is already a user with username.");

    let (_, users) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(users.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_reports_every_password_violation() {
    let app = empty_app();

    let mut payload = valid_user("shorty");
    payload["password"] = json!("short");

    let (status, body) = send(&app, "POST", "/api/users", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);

    let messages = body["error"]["fields"]["password"].as_array().unwrap();
    let messages: Vec<&str> = messages.iter().map(|m| m.as_str().unwrap()).collect();
    assert!(messages.contains(&"Password must be at least 6 characters."));
    assert!(messages.contains(&"Password must contain at least one uppercase letter."));
    assert!(messages.contains(&"Password must contain at least one number."));
    assert!(messages.contains(&"Password must contain at least one special character."));
    assert!(messages.contains(&"Password must contain at least one Armenian letter."));
}

#[tokio::test]
async fn test_create_empty_body_reports_required_fields() {
    let app = empty_app();

    let (status, body) = send(&app, "POST", "/api/users", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);

    let fields = body["error"]["fields"].as_object().unwrap();
    for field in ["username", "email", "password", "dateOfBirth", "quantity", "price", "amount"] {
        assert!(fields.contains_key(field), "missing messages for {}", field);
    }
}

#[tokio::test]
async fn test_replace_with_taken_username_leaves_record_unchanged() {
    let app = seeded_app();

    let (status, _) = send(&app, "PUT", "/api/users/1", Some(valid_user("jane_smith"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/users/1", None).await;
    assert_eq!(body["username"], "john_doe");
}

#[tokio::test]
async fn test_replace_keeps_id() {
    let app = seeded_app();

    let (status, body) = send(&app, "PUT", "/api/users/2", Some(valid_user("jane_new"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 2);
    assert_eq!(body["username"], "jane_new");
}

#[tokio::test]
async fn test_replace_missing_user() {
    let app = seeded_app();

    let (status, _) = send(&app, "PUT", "/api/users/99", Some(valid_user("ghost"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_username() {
    let app = seeded_app();

    let patch = json!([{"op": "replace", "path": "/username", "value": "john_new"}]);
    let (status, body) = send(&app, "PATCH", "/api/users/1", Some(patch)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["username"], "john_new");
}

#[tokio::test]
async fn test_patch_path_is_case_insensitive() {
    let app = seeded_app();

    let patch = json!([{"op": "replace", "path": "/Quantity", "value": 7}]);
    let (status, body) = send(&app, "PATCH", "/api/users/3", Some(patch)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 7);
}

#[tokio::test]
async fn test_patch_duplicate_username() {
    let app = seeded_app();

    let patch = json!([{"op": "replace", "path": "/username", "value": "max_muster"}]);
    let (status, body) = send(&app, "PATCH", "/api/users/1", Some(patch)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "duplicate_username");
}

#[tokio::test]
async fn test_patch_missing_user() {
    let app = seeded_app();

    let patch = json!([{"op": "replace", "path": "/username", "value": "ghost"}]);
    let (status, _) = send(&app, "PATCH", "/api/users/99", Some(patch)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_invalid_value_is_rejected_before_storing() {
    let app = seeded_app();

    let patch = json!([{"op": "replace", "path": "/quantity", "value": -5}]);
    let (status, body) = send(&app, "PATCH", "/api/users/2", Some(patch)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"]["quantity"].is_array());

    let (_, user) = send(&app, "GET", "/api/users/2", None).await;
    assert_eq!(user["quantity"], 2);
}

#[tokio::test]
async fn test_patch_unknown_path() {
    let app = seeded_app();

    let patch = json!([{"op": "replace", "path": "/nickname", "value": "x"}]);
    let (status, body) = send(&app, "PATCH", "/api/users/1", Some(patch)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_patch");
}

#[tokio::test]
async fn test_patch_cannot_copy_stored_password() {
    let app = seeded_app();

    let patch = json!([{"op": "copy", "from": "/password", "path": "/username"}]);
    let (status, body) = send(&app, "PATCH", "/api/users/1", Some(patch)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_patch");

    let (_, users) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(users[0]["username"], "john_doe");
    assert!(!users.to_string().contains("$argon2"));
}

#[tokio::test]
async fn test_patch_cannot_test_stored_password() {
    let app = seeded_app();

    let patch = json!([{"op": "test", "path": "/password", "value": "Password123!"}]);
    let (status, body) = send(&app, "PATCH", "/api/users/1", Some(patch)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_patch");
}

#[tokio::test]
async fn test_patch_failing_midway_stores_nothing() {
    let app = seeded_app();

    let patch = json!([
        {"op": "replace", "path": "/email", "value": "changed@example.com"},
        {"op": "test", "path": "/quantity", "value": 99}
    ]);
    let (status, _) = send(&app, "PATCH", "/api/users/1", Some(patch)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, user) = send(&app, "GET", "/api/users/1", None).await;
    assert_eq!(user["email"], "john.doe@example.com");
}

#[tokio::test]
async fn test_patch_empty_document() {
    let app = seeded_app();

    let (status, body) = send(&app, "PATCH", "/api/users/1", Some(json!([]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid patch document.");
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = seeded_app();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"], 3);

    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/users/{id}"].is_object());
}
