//! Store repository.
//!
//! Store rows come from content-store `store` entries and carry the secret
//! used to verify that store's product webhooks.

use secrecy::{ExposeSecret, SecretString};
use sqlx::{FromRow, PgPool};

use modamatch_core::{ContentfulId, Platform};

use super::RepositoryError;

/// A store known to the catalog.
///
/// Implements `Debug` manually to redact the webhook secret.
#[derive(Clone)]
pub struct StoreRecord {
    /// Store id used in webhook headers and listing queries
    pub shop_name: String,
    pub platform: Platform,
    /// Content-store entry this row was published from
    pub contentful_id: Option<ContentfulId>,
    /// HMAC key for product webhooks
    pub secret_key: SecretString,
    pub enabled: bool,
}

impl std::fmt::Debug for StoreRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRecord")
            .field("shop_name", &self.shop_name)
            .field("platform", &self.platform)
            .field("contentful_id", &self.contentful_id)
            .field("secret_key", &"[REDACTED]")
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[derive(FromRow)]
struct StoreRow {
    shop_name: String,
    platform: String,
    contentful_id: Option<ContentfulId>,
    secret_key: String,
    enabled: bool,
}

impl TryFrom<StoreRow> for StoreRecord {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        Ok(Self {
            platform: row
                .platform
                .parse()
                .map_err(RepositoryError::DataCorruption)?,
            shop_name: row.shop_name,
            contentful_id: row.contentful_id,
            secret_key: SecretString::from(row.secret_key),
            enabled: row.enabled,
        })
    }
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an enabled store by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_enabled(&self, shop_name: &str) -> Result<Option<StoreRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT shop_name, platform, contentful_id, secret_key, enabled
            FROM catalog.store
            WHERE shop_name = $1 AND enabled
            ",
        )
        .bind(shop_name)
        .fetch_optional(self.pool)
        .await?;

        row.map(StoreRecord::try_from).transpose()
    }

    /// Get the store published from a content-store entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_contentful_id(
        &self,
        contentful_id: &ContentfulId,
    ) -> Result<Option<StoreRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT shop_name, platform, contentful_id, secret_key, enabled
            FROM catalog.store
            WHERE contentful_id = $1
            ",
        )
        .bind(contentful_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(StoreRecord::try_from).transpose()
    }

    /// Insert or update a store.
    ///
    /// A content entry that renames its store id replaces the old row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, store: &StoreRecord) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(contentful_id) = &store.contentful_id {
            sqlx::query("DELETE FROM catalog.store WHERE contentful_id = $1 AND shop_name <> $2")
                .bind(contentful_id)
                .bind(&store.shop_name)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r"
            INSERT INTO catalog.store (shop_name, platform, contentful_id, secret_key, enabled)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (shop_name) DO UPDATE SET
                platform = EXCLUDED.platform,
                contentful_id = EXCLUDED.contentful_id,
                secret_key = EXCLUDED.secret_key,
                enabled = EXCLUDED.enabled,
                updated_at = NOW()
            ",
        )
        .bind(&store.shop_name)
        .bind(store.platform.as_str())
        .bind(&store.contentful_id)
        .bind(store.secret_key.expose_secret())
        .bind(store.enabled)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete the store published from a content-store entry.
    ///
    /// Returns the removed store's name, if there was one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_by_contentful_id(
        &self,
        contentful_id: &ContentfulId,
    ) -> Result<Option<String>, RepositoryError> {
        let shop_name = sqlx::query_scalar::<_, String>(
            "DELETE FROM catalog.store WHERE contentful_id = $1 RETURNING shop_name",
        )
        .bind(contentful_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(shop_name)
    }
}
