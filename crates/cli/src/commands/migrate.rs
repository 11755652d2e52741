//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! mm-cli migrate catalog
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string for the catalog
//!   (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Catalog migrations: `crates/catalog/migrations/`, embedded at build time.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run catalog database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the database is
/// unreachable, or a migration fails.
pub async fn catalog() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("CATALOG_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("CATALOG_DATABASE_URL"))?;

    tracing::info!("Connecting to catalog database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running catalog migrations...");
    sqlx::migrate!("../catalog/migrations").run(&pool).await?;

    tracing::info!("Catalog migrations complete!");
    Ok(())
}
