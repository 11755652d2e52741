//! HTTP route handlers for the catalog service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Liveness check
//! GET  /health/ready                             - Readiness check (database)
//!
//! # API
//! GET  /api/products                             - Enabled products of a shop
//! GET  /api/products/{id}                        - One enabled product
//! GET  /api/categories/count                     - Product counts per category
//! POST /api/customer/feedback                    - Store shopper feedback
//! GET  /api/customer/preferences?email=          - Saved shopper preferences
//! POST /api/customer/preferences?email=          - Save shopper preferences
//!
//! # Webhooks
//! POST /api/shopify/webhook/product              - Shopify product events (HMAC)
//! POST /api/woocommerce/{shop_id}/webhook/product - WooCommerce product events (HMAC)
//! POST /api/contentful/webhook/item              - Contentful entry events (shared secret)
//! ```

pub mod customers;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the catalog router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/api/products", get(products::list))
        .route("/api/products/{id}", get(products::show))
        .route("/api/categories/count", get(products::count_by_category))
        .route("/api/customer/feedback", post(customers::submit_feedback))
        .route(
            "/api/customer/preferences",
            get(customers::get_preferences).post(customers::save_preferences),
        )
        .route("/api/shopify/webhook/product", post(webhooks::shopify_product))
        .route(
            "/api/woocommerce/{shop_id}/webhook/product",
            post(webhooks::woocommerce_product),
        )
        .route("/api/contentful/webhook/item", post(webhooks::contentful_entry))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
