//! Registration, login, guest data migration, profile, and password flows.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use model2design_integration_tests::{Client, Part, TestApp};

const PASSWORD: &str = "correct-horse";

fn registration(email: &str) -> Value {
    json!({
        "full_name": "Jane Doe",
        "email": email,
        "phone": "(555) 123-4567",
        "password": PASSWORD,
        "password_confirm": PASSWORD,
    })
}

async fn register(client: &mut Client<'_>, email: &str) {
    let resp = client.post("/api/accounts/register", &registration(email)).await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
}

async fn login(client: &mut Client<'_>, email: &str, password: &str) -> model2design_integration_tests::TestResponse {
    client
        .post(
            "/api/accounts/login",
            &json!({"email": email, "password": password}),
        )
        .await
}

#[tokio::test]
async fn test_register_signs_in() {
    let app = TestApp::new();
    let mut client = app.client();

    let resp = client
        .post("/api/accounts/register", &registration("Jane@Example.COM"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.str("message"), "Welcome, Jane Doe! Your account has been created.");
    assert_eq!(resp.body["user"]["email"], "jane@example.com");
    assert_eq!(resp.body["redirect"], "/");

    let resp = client.get("/api/accounts/me").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user"]["full_name"], "Jane Doe");
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();
    let mut client = app.client();
    register(&mut client, "jane@example.com").await;

    let mut other = app.client();
    let resp = other
        .post("/api/accounts/register", &registration("JANE@example.com"))
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.str("error"), "This email is already registered");

    let mut form = registration("short@example.com");
    form["password"] = json!("short");
    form["password_confirm"] = json!("short");
    let resp = other.post("/api/accounts/register", &form).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.str("error"), "Password must be at least 8 characters long");

    let mut form = registration("mismatch@example.com");
    form["password_confirm"] = json!("something-else");
    let resp = other.post("/api/accounts/register", &form).await;
    assert_eq!(resp.str("error"), "Passwords do not match");

    let mut form = registration("phone@example.com");
    form["phone"] = json!("12345");
    let resp = other.post("/api/accounts/register", &form).await;
    assert_eq!(resp.str("error"), "Please enter a valid 10-digit phone number");
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = TestApp::new();
    register(&mut app.client(), "jane@example.com").await;
    let mut client = app.client();

    let resp = login(&mut client, "jane@example.com", "wrong-password").await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.str("error"), "Invalid email or password");

    let resp = login(&mut client, "JANE@example.com", PASSWORD).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.str("message"), "Welcome back, Jane Doe!");
    assert_eq!(client.get("/api/accounts/me").await.status, StatusCode::OK);

    let resp = client.post("/api/accounts/logout", &json!({})).await;
    assert!(resp.success());
    let resp = client.get("/api/accounts/me").await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.str("error"), "Authentication required");
}

#[tokio::test]
async fn test_login_redirect_must_be_local() {
    let app = TestApp::new();
    register(&mut app.client(), "jane@example.com").await;

    let resp = app
        .client()
        .post(
            "/api/accounts/login",
            &json!({"email": "jane@example.com", "password": PASSWORD, "next": "/designs"}),
        )
        .await;
    assert_eq!(resp.body["redirect"], "/designs");

    let resp = app
        .client()
        .post(
            "/api/accounts/login",
            &json!({"email": "jane@example.com", "password": PASSWORD, "next": "//evil.example"}),
        )
        .await;
    assert_eq!(resp.body["redirect"], "/");
}

#[tokio::test]
async fn test_guest_data_moves_to_account_on_register() {
    let app = TestApp::new();
    let brand = app.default_brand().await;
    let hoodie = app
        .product(brand.id, "Pro Hoodie", &["M"], &[(1, 100)])
        .await;
    let product = hoodie.id.to_string();
    let mut client = app.client();

    let resp = client
        .post_multipart(
            "/api/designs",
            &[
                Part::Text("name", "Team Logo"),
                Part::Text("product", &product),
                Part::Text("data", r#"{"layers": []}"#),
            ],
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    let design_id = resp.body["design_id"].as_i64().unwrap();

    client
        .post(
            "/api/cart/add",
            &json!({"design_id": design_id, "product_id": hoodie.id, "size": "M", "quantity": 2}),
        )
        .await;

    let resp = client
        .post("/api/accounts/register", &registration("jane@example.com"))
        .await;
    assert_eq!(resp.body["migrated"]["cart_items"], 1);
    assert_eq!(resp.body["migrated"]["designs"], 1);

    let resp = client.get("/api/cart").await;
    assert_eq!(resp.body["count"], 2);
    assert_eq!(resp.body["items"][0]["design_id"], design_id.to_string());

    let resp = client.get(&format!("/api/designs/{design_id}")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["design"]["name"], "Team Logo");

    let resp = client.get("/api/accounts/dashboard").await;
    assert_eq!(resp.body["design_count"], 1);
}

#[tokio::test]
async fn test_update_profile_and_change_password() {
    let app = TestApp::new();
    register(&mut app.client(), "taken@example.com").await;
    let mut client = app.client();
    register(&mut client, "jane@example.com").await;

    let resp = client
        .post(
            "/api/accounts/profile",
            &json!({"full_name": "Jane Smith", "email": "taken@example.com", "phone": "5551234567"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.str("error"), "This email is already in use by another account");

    let resp = client
        .post(
            "/api/accounts/profile",
            &json!({"full_name": "Jane Smith", "email": "jane.smith@example.com", "phone": "5551234567"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user"]["full_name"], "Jane Smith");

    let resp = client
        .post(
            "/api/accounts/password",
            &json!({"current_password": "nope-nope", "new_password": "new-password-1", "new_password_confirm": "new-password-1"}),
        )
        .await;
    assert_eq!(resp.str("error"), "Current password is incorrect");

    let resp = client
        .post(
            "/api/accounts/password",
            &json!({"current_password": PASSWORD, "new_password": "new-password-1", "new_password_confirm": "new-password-1"}),
        )
        .await;
    assert!(resp.success());

    let resp = login(&mut app.client(), "jane.smith@example.com", "new-password-1").await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new();
    register(&mut app.client(), "jane@example.com").await;
    let mut client = app.client();

    let resp = client
        .post("/api/accounts/password/forgot", &json!({"email": "nobody@example.com"}))
        .await;
    assert!(resp.success());
    app.settle().await;
    assert!(app.mailer.sent().is_empty());

    let resp = client
        .post("/api/accounts/password/forgot", &json!({"email": "jane@example.com"}))
        .await;
    assert!(resp.success());
    app.settle().await;

    let token = app.store.reset_tokens().pop().unwrap().token;
    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "jane@example.com");
    assert!(sent[0].text.contains(&format!("/accounts/password/reset?token={token}")));

    let resp = client
        .post(
            "/api/accounts/password/reset",
            &json!({"token": token, "password": "brand-new-pass", "password_confirm": "brand-new-pass"}),
        )
        .await;
    assert!(resp.success(), "{:?}", resp.body);

    // Tokens are single use
    let resp = client
        .post(
            "/api/accounts/password/reset",
            &json!({"token": token, "password": "another-pass", "password_confirm": "another-pass"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.str("error"), "Invalid or expired reset link.");

    let resp = login(&mut client, "jane@example.com", "brand-new-pass").await;
    assert_eq!(resp.status, StatusCode::OK);
}
