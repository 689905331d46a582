//! Brand design templates, brand library images, and shared brand templates.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use model2design_core::{BrandId, ProductId};
use model2design_integration_tests::TestApp;
use model2design_storefront::db::BrandRepository;
use model2design_storefront::models::{
    NewBrand, NewBrandImage, NewBrandTemplate, NewDesignTemplate, Thumbnails,
};

fn template(brand: BrandId, name: &str, sort_order: i32, is_active: bool) -> NewDesignTemplate {
    NewDesignTemplate {
        brand_id: brand,
        name: name.to_string(),
        description: String::new(),
        product_id: ProductId::new(3),
        data: json!({"layers": {"Front": {"decals": []}}}),
        thumbnails: Thumbnails {
            front: Some(format!("/media/templates/{sort_order}.png")),
            ..Thumbnails::default()
        },
        is_active,
        sort_order,
    }
}

fn brand_template(brand: BrandId, name: &str, featured: bool, uses: u32, public: bool) -> NewBrandTemplate {
    NewBrandTemplate {
        brand_id: brand,
        name: name.to_string(),
        description: String::new(),
        data: json!({}),
        thumbnail_url: String::new(),
        is_public: public,
        is_featured: featured,
        usage_count: uses,
    }
}

#[tokio::test]
async fn test_templates_are_listed_per_brand_in_order() {
    let app = TestApp::new();
    let default = app.default_brand().await;
    let acme = app.brand("Acme Sports", "acme").await;

    app.store.add_design_template(&template(default.id, "Older", 1, true));
    app.store.add_design_template(&template(default.id, "Newer", 1, true));
    app.store.add_design_template(&template(default.id, "First", 0, true));
    let hidden = app.store.add_design_template(&template(default.id, "Retired", 0, false));
    let foreign = app.store.add_design_template(&template(acme.id, "Acme Crest", 0, true));

    let mut client = app.client();
    let resp = client.get("/api/designs/templates").await;
    assert_eq!(resp.status, StatusCode::OK);
    let names: Vec<&str> = resp.body["templates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["First", "Newer", "Older"]);
    assert_eq!(resp.body["templates"][0]["product_id"], 3);
    assert_eq!(resp.body["templates"][0]["thumbnails"]["front"], "/media/templates/0.png");

    let resp = client.get(&format!("/api/designs/templates/{}", hidden.id)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.str("error"), "Template not found");

    let resp = client.get(&format!("/api/designs/templates/{}", foreign.id)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app
        .client_for("acme.model2design.test")
        .get(&format!("/api/designs/templates/{}", foreign.id))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["template"]["name"], "Acme Crest");
    assert_eq!(resp.body["template"]["data"]["layers"]["Front"]["decals"], json!([]));
}

#[tokio::test]
async fn test_image_library_includes_brand_images() {
    let app = TestApp::new();
    let default = app.default_brand().await;
    let acme = app.brand("Acme Sports", "acme").await;
    let backgrounds = app.store.add_brand_image_category(default.id, "Backgrounds");

    let stripes = app.store.add_brand_image(&NewBrandImage {
        brand_id: default.id,
        category_id: Some(backgrounds.id),
        name: "Stripes".to_string(),
        image_url: "https://cdn.model2design.test/stripes.jpg".to_string(),
        thumbnail_url: "https://cdn.model2design.test/stripes-thumb.jpg".to_string(),
        width: Some(1200),
        height: Some(800),
        file_size: Some(52_000),
    });
    app.store.add_brand_image(&NewBrandImage {
        brand_id: acme.id,
        category_id: None,
        name: "Acme Logo".to_string(),
        image_url: "https://cdn.model2design.test/acme.jpg".to_string(),
        thumbnail_url: String::new(),
        width: None,
        height: None,
        file_size: None,
    });

    let resp = app.client().get("/api/designs/images").await;
    assert_eq!(resp.status, StatusCode::OK);
    let images = resp.body["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    let image = &images[0];
    assert_eq!(image["id"], format!("brand_{}", stripes.id));
    assert_eq!(image["source"], "brand");
    assert_eq!(image["category_id"], backgrounds.id.as_i32());
    assert_eq!(image["thumbnail_url"], "https://cdn.model2design.test/stripes-thumb.jpg");
    assert_eq!(image["width"], 1200);

    let resp = app.client_for("acme.model2design.test").get("/api/designs/images").await;
    let image = &resp.body["images"][0];
    assert_eq!(image["name"], "Acme Logo");
    assert_eq!(image["thumbnail_url"], image["image_url"]);
    assert!(image["category_id"].is_null());

    // Brand images are not the customer's to delete.
    let resp = app
        .client()
        .delete(&format!("/api/designs/images/brand_{}", stripes.id))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.str("error"), "Invalid image ID format");
}

#[tokio::test]
async fn test_public_brand_templates_require_sign_in() {
    let app = TestApp::new();
    let default = app.default_brand().await;
    let acme = app.brand("Acme Sports", "acme").await;
    let mut retired = NewBrand::named("Retired Co").with_subdomain("retired");
    retired.is_active = false;
    let retired = app.store.create(&retired).await.unwrap();

    app.store.add_brand_template(&brand_template(default.id, "Popular", false, 40, true));
    app.store.add_brand_template(&brand_template(acme.id, "Featured", true, 2, true));
    app.store.add_brand_template(&brand_template(acme.id, "Private", true, 90, false));
    app.store.add_brand_template(&brand_template(retired.id, "Orphan", true, 99, true));
    app.store.add_brand_template(&brand_template(default.id, "Quiet", false, 1, true));

    let mut client = app.client();
    let resp = client.get("/api/brand/templates").await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = client
        .post(
            "/api/accounts/register",
            &json!({
                "full_name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "5551234567",
                "password": "correct-horse",
                "password_confirm": "correct-horse",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = client.get("/api/brand/templates").await;
    assert_eq!(resp.status, StatusCode::OK);
    let templates = resp.body["templates"].as_array().unwrap();
    let names: Vec<&str> = templates.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Featured", "Popular", "Quiet"]);
    assert_eq!(templates[0]["brand_name"], "Acme Sports");
    assert_eq!(templates[1]["usage_count"], 40);
}
