//! Catalog HTTP surface through the full application stack.
//!
//! The database pool points at a closed port, so every request either stops
//! before querying or reports the outage as a server error.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use modamatch_catalog::config::CatalogConfig;
use modamatch_catalog::db::StoreRecord;
use modamatch_catalog::state::AppState;
use modamatch_catalog::webhook::{
    CONTENTFUL_SECRET, CONTENTFUL_TOPIC, SHOPIFY_SHOP_DOMAIN, SHOPIFY_SIGNATURE, SHOPIFY_TOPIC,
    WOOCOMMERCE_EVENT, WOOCOMMERCE_SIGNATURE, sign,
};
use modamatch_core::Platform;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

const UNREACHABLE_DATABASE: &str = "postgres://localhost:1/modamatch_catalog_test";
const HOOK_SECRET: &str = "hook-Zq8!r2Lw";
const SHOP_SECRET: &str = "wc-secret-91fa";

async fn app() -> Router {
    let config = CatalogConfig {
        database_url: SecretString::from(UNREACHABLE_DATABASE),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        contentful_webhook_secret: SecretString::from(HOOK_SECRET),
        store_cache_ttl: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
    };
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy(UNREACHABLE_DATABASE)
        .unwrap();

    let state = AppState::new(config, pool);
    state
        .cache_store(StoreRecord {
            shop_name: "boutique-7".to_owned(),
            platform: Platform::Woocommerce,
            contentful_id: None,
            secret_key: SecretString::from(SHOP_SECRET),
            enabled: true,
        })
        .await;

    modamatch_catalog::app(state)
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Health and CORS
// =============================================================================

#[tokio::test]
async fn test_liveness_and_readiness() {
    let app = app().await;

    let live = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(live.status(), StatusCode::OK);

    let ready = app
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_widget_origin_may_call_the_api() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/products")
        .header(header::ORIGIN, "https://app.modamatch.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

// =============================================================================
// Product API
// =============================================================================

#[tokio::test]
async fn test_bad_paging_is_rejected_before_querying() {
    let response = app()
        .await
        .oneshot(
            Request::get("/api/products?shopName=boutique-7&limit=lots")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["errorCode"], "InvalidParameters");
    assert_eq!(body["errorMessage"], "Invalid limit");
}

#[tokio::test]
async fn test_database_outage_hides_details() {
    let response = app()
        .await
        .oneshot(
            Request::get("/api/products?shopName=boutique-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["errorCode"], "UnexpectedError");
    assert_eq!(body["errorMessage"], "An unexpected error occurred");
}

#[tokio::test]
async fn test_decimal_price_bounds_are_accepted() {
    let response = app()
        .await
        .oneshot(
            Request::get("/api/products?shopName=boutique-7&priceRange%5B%5D=19.99&priceRange%5B%5D=49.5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Parsing passed; the query itself hits the missing database.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// Shopper Feedback and Preferences
// =============================================================================

#[tokio::test]
async fn test_feedback_with_missing_fields_is_rejected() {
    let response = app()
        .await
        .oneshot(
            Request::post("/api/customer/feedback")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"storeId":"boutique-7","message":"Runs small"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["errorMessage"], "All values must be provided");
}

#[tokio::test]
async fn test_preferences_need_an_email() {
    let response = app()
        .await
        .oneshot(
            Request::get("/api/customer/preferences")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["errorMessage"], "Email must be provided");
}

// =============================================================================
// Webhook Authentication
// =============================================================================

#[tokio::test]
async fn test_woocommerce_signature_must_match_store_secret() {
    let body = r#"{"id":30,"parent_id":0,"status":"publish"}"#;
    let request = Request::post("/api/woocommerce/boutique-7/webhook/product")
        .header(WOOCOMMERCE_EVENT, "updated")
        .header(
            WOOCOMMERCE_SIGNATURE,
            sign(b"another-store-secret", body.as_bytes()).unwrap(),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "HMAC validation failed");
}

#[tokio::test]
async fn test_unknown_shop_is_looked_up_in_the_database() {
    let body = r#"{"id":7,"status":"active"}"#;
    let request = Request::post("/api/shopify/webhook/product")
        .header(SHOPIFY_SHOP_DOMAIN, "unlisted.myshopify.com")
        .header(SHOPIFY_TOPIC, "products/update")
        .header(SHOPIFY_SIGNATURE, sign(SHOP_SECRET.as_bytes(), body.as_bytes()).unwrap())
        .body(Body::from(body))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_content_webhook_requires_shared_secret() {
    let entry = r#"{"sys":{"id":"item-1","contentType":{"sys":{"id":"item"}}},"fields":{}}"#;

    let rejected = app()
        .await
        .oneshot(
            Request::post("/api/contentful/webhook/item")
                .header(CONTENTFUL_TOPIC, "ContentManagement.Entry.publish")
                .body(Body::from(entry))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(rejected).await, "Invalid webhook secret");

    let accepted = app()
        .await
        .oneshot(
            Request::post("/api/contentful/webhook/item")
                .header(CONTENTFUL_SECRET, HOOK_SECRET)
                .header(CONTENTFUL_TOPIC, "ContentManagement.Entry.publish")
                .body(Body::from(entry))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
}
