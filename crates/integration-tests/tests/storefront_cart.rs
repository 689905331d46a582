//! Guest (session) and user (database) carts.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::str::FromStr;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use model2design_integration_tests::TestApp;

fn money(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

async fn app_with_hoodie() -> (TestApp, i32) {
    let app = TestApp::new();
    let brand = app.default_brand().await;
    let hoodie = app
        .product(brand.id, "Pro Hoodie", &["S", "M", "L"], &[(1, 100), (3, 90)])
        .await;
    (app, hoodie.id.as_i32())
}

#[tokio::test]
async fn test_guest_cart_add_and_totals() {
    let (app, product) = app_with_hoodie().await;
    let mut client = app.client();

    let resp = client
        .post(
            "/api/cart/add",
            &json!({"design_id": 42, "product_id": product, "size": "M", "quantity": 2}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["cart_count"], 2);
    assert!(client.has_session());

    let resp = client.get("/api/cart").await;
    let items = resp.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "guest_42");
    assert_eq!(items[0]["design_name"], "Design 42");
    assert_eq!(money(&items[0]["unit_price"]), Decimal::from(100));
    assert_eq!(money(&resp.body["subtotal"]), Decimal::from(200));
    assert_eq!(money(&resp.body["shipping"]), Decimal::from(15));
    assert_eq!(money(&resp.body["total"]), Decimal::from(215));

    // Same design again accumulates into the line
    client
        .post(
            "/api/cart/add",
            &json!({"design_id": "42", "product_id": product, "size": "L"}),
        )
        .await;
    let resp = client.get("/api/cart/count").await;
    assert_eq!(resp.body["count"], 3);

    // Three units reach the second tier
    let resp = client.get("/api/cart").await;
    assert_eq!(money(&resp.body["items"][0]["unit_price"]), Decimal::from(90));
}

#[tokio::test]
async fn test_guest_carts_are_per_session() {
    let (app, product) = app_with_hoodie().await;
    let mut alice = app.client();
    let mut bob = app.client();

    alice
        .post(
            "/api/cart/add",
            &json!({"design_id": 7, "product_id": product, "size": "S"}),
        )
        .await;

    assert_eq!(alice.get("/api/cart/count").await.body["count"], 1);
    assert_eq!(bob.get("/api/cart/count").await.body["count"], 0);
}

#[tokio::test]
async fn test_add_rejects_bad_requests() {
    let (app, product) = app_with_hoodie().await;
    let mut client = app.client();

    let resp = client
        .post(
            "/api/cart/add",
            &json!({"design_id": 1, "product_id": product, "size": "XXL"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.str("error"), "Invalid size selected");

    let resp = client
        .post(
            "/api/cart/add",
            &json!({"design_id": 1, "product_id": product, "size": "M", "quantity": 0}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.str("error"), "Quantity must be a positive number");

    let resp = client
        .post("/api/cart/add", &json!({"product_id": product, "size": "M"}))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.str("error"), "Missing required fields");

    let resp = client
        .post(
            "/api/cart/add",
            &json!({"design_id": 1, "product_id": 9999, "size": "M"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.str("error"), "Product not found");
}

#[tokio::test]
async fn test_update_sizes_and_remove() {
    let (app, product) = app_with_hoodie().await;
    let mut client = app.client();
    client
        .post(
            "/api/cart/add",
            &json!({"design_id": 5, "product_id": product, "size": "M"}),
        )
        .await;

    let resp = client
        .post(
            "/api/cart/items/guest_5/sizes",
            &json!({"sizes": {"S": 1, "M": 2, "L": 0}}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["items"][0]["quantity"], 3);
    assert_eq!(money(&resp.body["subtotal"]), Decimal::from(270));

    let resp = client.post("/api/cart/items/guest_99/remove", &json!({})).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = client.post("/api/cart/items/guest_5/remove", &json!({})).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["cart_count"], 0);
}

#[tokio::test]
async fn test_empty_sizes_remove_line_and_clear() {
    let (app, product) = app_with_hoodie().await;
    let mut client = app.client();
    for design in [1, 2] {
        client
            .post(
                "/api/cart/add",
                &json!({"design_id": design, "product_id": product, "size": "M"}),
            )
            .await;
    }

    let resp = client
        .post("/api/cart/items/guest_1/sizes", &json!({"sizes": {}}))
        .await;
    assert_eq!(resp.body["items"].as_array().unwrap().len(), 1);

    let resp = client.post("/api/cart/clear", &json!({})).await;
    assert_eq!(resp.body["cart_count"], 0);
    assert_eq!(client.get("/api/cart/count").await.body["count"], 0);
}

#[tokio::test]
async fn test_user_cart_lives_in_database() {
    let (app, product) = app_with_hoodie().await;
    let mut client = app.client();
    let resp = client
        .post(
            "/api/accounts/register",
            &json!({
                "full_name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "555-123-4567",
                "password": "correct-horse",
                "password_confirm": "correct-horse",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = client
        .post(
            "/api/cart/add",
            &json!({"design_id": 3, "product_id": product, "size": "L", "quantity": 3}),
        )
        .await;
    assert_eq!(resp.body["cart_count"], 3);

    let resp = client.get("/api/cart").await;
    let item = &resp.body["items"][0];
    assert!(item["id"].as_str().unwrap().bytes().all(|b| b.is_ascii_digit()));
    assert_eq!(money(&item["unit_price"]), Decimal::from(90));
    assert_eq!(money(&resp.body["total"]), Decimal::from(285));
}
