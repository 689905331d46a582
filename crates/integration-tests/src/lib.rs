//! Integration tests for the Model2Design storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p model2design-integration-tests
//! ```
//!
//! The tests drive the full router in-process with `tower::ServiceExt::oneshot`
//! over the in-memory repositories and `tower_sessions::MemoryStore`, so no
//! database or server is needed. [`Client`] carries the session cookie from
//! one request to the next the way a browser would.
//!
//! # Test Categories
//!
//! - `storefront_brand` - Brand resolution, brand API, catalog
//! - `storefront_cart` - Guest and user carts
//! - `storefront_accounts` - Registration, login, guest migration, passwords
//! - `storefront_designs` - Designs and the image library
//! - `storefront_support` - Support intake and help content

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use model2design_core::{BrandId, PriceTiers};
use model2design_storefront::app::build_router;
use model2design_storefront::config::{MailerConfig, MediaConfig, SentryConfig, StorefrontConfig};
use model2design_storefront::db::{BrandRepository, CatalogRepository, MemoryStore, Repositories};
use model2design_storefront::middleware::{SESSION_COOKIE_NAME, create_session_layer};
use model2design_storefront::models::{Brand, BrandProduct, NewBrand, NewProduct, Product};
use model2design_storefront::services::mailer::MemoryMailer;
use model2design_storefront::state::AppState;
use model2design_storefront::storage::MemoryFileStorage;

/// Apex domain the test hosts live under.
pub const BASE_DOMAIN: &str = "model2design.test";

/// Inbox support notifications are sent to.
pub const SUPPORT_INBOX: &str = "support@model2design.test";

/// Configuration for an in-memory storefront.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("memory"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://model2design.test".to_string(),
        base_domain: Some(BASE_DOMAIN.to_string()),
        session_secret: SecretString::from("kX9#mQ2$vL7@pR4!nW8&jT3*hY6^bF1%"),
        media: MediaConfig::default(),
        mailer: MailerConfig {
            support_email: SUPPORT_INBOX.to_string(),
            ..MailerConfig::default()
        },
        rate_limiting: false,
        sentry: SentryConfig::default(),
        json_logs: false,
    }
}

/// The application plus handles on everything it writes to.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryFileStorage>,
    pub mailer: Arc<MemoryMailer>,
    router: Router,
}

impl TestApp {
    /// A storefront over empty in-memory state.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let storage = Arc::new(MemoryFileStorage::default());
        let mailer = Arc::new(MemoryMailer::default());

        let config = test_config();
        let session_layer = create_session_layer(tower_sessions::MemoryStore::default(), &config);
        let state = AppState::new(
            config,
            None,
            Repositories::from_memory(&store),
            storage.clone(),
            mailer.clone(),
        );

        Self {
            store,
            storage,
            mailer,
            router: build_router(state, session_layer),
        }
    }

    /// A browser visiting the main domain.
    #[must_use]
    pub fn client(&self) -> Client<'_> {
        self.client_for(BASE_DOMAIN)
    }

    /// A browser visiting `host`.
    #[must_use]
    pub fn client_for(&self, host: &str) -> Client<'_> {
        Client {
            app: self,
            host: host.to_string(),
            cookie: None,
        }
    }

    /// Create the default brand.
    pub async fn default_brand(&self) -> Brand {
        self.store
            .create(&NewBrand::default_brand())
            .await
            .expect("create default brand")
    }

    /// Create an active brand served on `subdomain`.
    pub async fn brand(&self, name: &str, subdomain: &str) -> Brand {
        self.store
            .create(&NewBrand::named(name).with_subdomain(subdomain))
            .await
            .expect("create brand")
    }

    /// Create an orderable product and list it for `brand` with the
    /// product's own prices.
    pub async fn product(&self, brand: BrandId, name: &str, sizes: &[&str], tiers: &[(u32, i64)]) -> Product {
        self.product_with_override(brand, name, sizes, tiers, &[]).await
    }

    /// Like [`TestApp::product`], with brand-specific price tiers.
    pub async fn product_with_override(
        &self,
        brand: BrandId,
        name: &str,
        sizes: &[&str],
        tiers: &[(u32, i64)],
        custom: &[(u32, i64)],
    ) -> Product {
        let product = self
            .store
            .upsert_product(&NewProduct::new(name, sizes, price_tiers(tiers)))
            .await
            .expect("create product");
        self.store
            .set_brand_product(&BrandProduct {
                brand_id: brand,
                product_id: product.id,
                is_available: true,
                custom_price_tiers: price_tiers(custom),
            })
            .await
            .expect("list product");
        product
    }

    /// Let background tasks (mail delivery) run.
    pub async fn settle(&self) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Price tiers from `(threshold, whole price)` pairs.
#[must_use]
pub fn price_tiers(pairs: &[(u32, i64)]) -> PriceTiers {
    PriceTiers::from_pairs(pairs.iter().map(|&(q, p)| (q, p.into()))).expect("valid tiers")
}

/// A response with its body parsed as JSON.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `Value::Null` for an empty body, a JSON string for non-JSON text.
    pub body: Value,
}

impl TestResponse {
    /// `body[key]` as a string, or `""`.
    #[must_use]
    pub fn str(&self, key: &str) -> &str {
        self.body.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.body.get("success").and_then(Value::as_bool) == Some(true)
    }
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    /// Field name, file name, content type, bytes.
    File(&'a str, &'a str, &'a str, &'a [u8]),
}

const BOUNDARY: &str = "m2d-test-boundary";

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, filename, content_type, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// A browser: one host, one session cookie.
pub struct Client<'a> {
    app: &'a TestApp,
    host: String,
    cookie: Option<String>,
}

impl Client<'_> {
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, Body::empty()).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None, Body::empty()).await
    }

    pub async fn post(&mut self, uri: &str, json: &Value) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Some("application/json".to_string()),
            Body::from(json.to_string()),
        )
        .await
    }

    pub async fn post_multipart(&mut self, uri: &str, parts: &[Part<'_>]) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Some(format!("multipart/form-data; boundary={BOUNDARY}")),
            Body::from(multipart_body(parts)),
        )
        .await
    }

    /// Whether the client holds a session cookie.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    async fn send(
        &mut self,
        method: Method,
        uri: &str,
        content_type: Option<String>,
        body: Body,
    ) -> TestResponse {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, &self.host);
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = request.body(body).expect("valid request");

        let response = self
            .app
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        self.remember_cookie(response.headers().get_all(header::SET_COOKIE).iter());

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    fn remember_cookie<'h>(&mut self, set_cookies: impl Iterator<Item = &'h HeaderValue>) {
        for value in set_cookies {
            let Ok(value) = value.to_str() else { continue };
            let Some(pair) = value.split(';').next() else {
                continue;
            };
            if !pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")) {
                continue;
            }
            // A removal cookie carries an empty value or an expiry in the past
            let removed = pair.ends_with('=') || value.contains("Max-Age=0");
            self.cookie = (!removed).then(|| pair.to_string());
        }
    }
}
