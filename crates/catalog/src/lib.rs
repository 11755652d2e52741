//! ModaMatch catalog service library.
//!
//! Keeps a `PostgreSQL` cache of store products merged with their content
//! links, fed by Shopify, WooCommerce and Contentful webhooks, and serves it
//! to the embedded widget.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;
pub mod sync;
pub mod webhook;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application with request tracing.
///
/// The widget calls the API from its own origin, so reads are open to any
/// origin.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
