//! Brand resolution, the brand API, and the per-brand catalog.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::Value;

use model2design_integration_tests::TestApp;
use model2design_storefront::db::BrandRepository;
use model2design_storefront::models::NewBrand;

#[tokio::test]
async fn test_health_skips_brand_resolution() {
    let app = TestApp::new();
    let mut client = app.client();

    let resp = client.get("/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, Value::String("ok".to_string()));

    let resp = client.get("/health/ready").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(app.store.brands().is_empty());
}

#[tokio::test]
async fn test_default_brand_created_on_first_request() {
    let app = TestApp::new();
    let mut client = app.client();

    let resp = client.get("/api/brand").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.success());
    assert_eq!(resp.body["brand"]["name"], "Model2Design");
    assert_eq!(resp.body["brand"]["is_default"], true);
    assert_eq!(resp.headers["x-brand-name"], "Model2Design");
    assert_eq!(resp.headers["x-brand-subdomain"], "default");

    // A second request reuses the same brand
    client.get("/api/brand").await;
    assert_eq!(app.store.brands().len(), 1);
}

#[tokio::test]
async fn test_deactivated_default_brand_is_replaced() {
    let app = TestApp::new();
    let mut retired = NewBrand::default_brand();
    retired.is_active = false;
    let retired = app.store.create(&retired).await.unwrap();

    let mut client = app.client();
    let resp = client.get("/api/brand").await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["brand"]["is_default"], true);
    assert_ne!(resp.body["brand"]["id"], retired.id.as_i32());

    let resp = client.get("/api/products").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(app.store.brands().iter().filter(|b| b.is_default).count(), 1);
}

#[tokio::test]
async fn test_subdomain_selects_brand() {
    let app = TestApp::new();
    app.default_brand().await;
    app.brand("Acme Sports", "acme").await;

    let resp = app.client_for("ACME.model2design.test:8000").get("/api/brand").await;
    assert_eq!(resp.body["brand"]["name"], "Acme Sports");
    assert_eq!(resp.body["brand"]["slug"], "acme-sports");
    assert_eq!(resp.headers["x-brand-subdomain"], "acme");
    assert_eq!(resp.body["css"]["--brand-primary"], resp.body["brand"]["primary_color"]);

    let resp = app.client_for("unknown.model2design.test").get("/api/brand").await;
    assert_eq!(resp.body["brand"]["name"], "Model2Design");

    let resp = app.client_for("www.model2design.test").get("/api/brand").await;
    assert_eq!(resp.body["brand"]["is_default"], true);
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = TestApp::new();
    let resp = app.client().get("/api/brand").await;
    assert_eq!(resp.headers["x-content-type-options"], "nosniff");
    assert!(resp.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_catalog_is_per_brand() {
    let app = TestApp::new();
    let default = app.default_brand().await;
    let acme = app.brand("Acme Sports", "acme").await;
    let hoodie = app
        .product(acme.id, "Pro Hoodie", &["S", "M", "L"], &[(1, 100), (5, 80)])
        .await;
    app.product(default.id, "Classic Tee", &["M"], &[(1, 20)]).await;

    let resp = app.client_for("acme.model2design.test").get("/api/products").await;
    let products = resp.body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Pro Hoodie");
    assert_eq!(products[0]["base_price"], "100");

    let uri = format!("/api/products/{}", hoodie.id);
    let resp = app.client_for("acme.model2design.test").get(&uri).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["product"]["id"], hoodie.id.as_i32());

    // Not offered on the main domain
    let resp = app.client().get(&uri).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.str("error"), "Product not found");
    assert_eq!(resp.body["success"], false);
}

#[tokio::test]
async fn test_brand_price_override() {
    let app = TestApp::new();
    let acme = app.brand("Acme Sports", "acme").await;
    app.product_with_override(acme.id, "Pro Hoodie", &["M"], &[(1, 100)], &[(1, 75)])
        .await;

    let resp = app.client_for("acme.model2design.test").get("/api/products").await;
    let product = &resp.body["products"][0];
    assert_eq!(product["base_price"], "75");
    assert_eq!(product["effective_price_tiers"]["1"], "75");
    assert_eq!(product["price_tiers"]["1"], "100");
}
