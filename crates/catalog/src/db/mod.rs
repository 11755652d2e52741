//! Database operations for the catalog `PostgreSQL`.
//!
//! # Database: `modamatch_catalog`
//!
//! The store platforms are the source of truth for products and the content
//! store for categories and try-on assets; this database is a cache of both,
//! rebuilt by webhooks.
//!
//! ## Tables
//!
//! - `catalog.store` - Stores and their webhook secrets
//! - `catalog.category` - Content-store categories and their clothing class
//! - `catalog.product` - Store products merged with their content link
//! - `catalog.feedback` - Shopper feedback from the widget
//! - `catalog.customer_preference` - Saved model choice per shopper email
//!
//! # Migrations
//!
//! Migrations are stored in `crates/catalog/migrations/` and run via:
//! ```bash
//! cargo run -p modamatch-cli -- migrate catalog
//! ```

pub mod categories;
pub mod customers;
pub mod products;
pub mod stores;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use customers::{CustomerPreference, FeedbackRepository, NewFeedback, PreferenceRepository};
pub use products::{PriceRange, ProductQuery, ProductRepository, SortOrder};
pub use stores::{StoreRecord, StoreRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
