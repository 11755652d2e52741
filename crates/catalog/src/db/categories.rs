//! Category repository.

use sqlx::PgPool;

use modamatch_core::{Category, CategoryId};

use super::RepositoryError;

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, category: &Category) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO catalog.category (contentful_id, store_id, name, clothing_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (contentful_id) DO UPDATE SET
                store_id = EXCLUDED.store_id,
                name = EXCLUDED.name,
                clothing_type = EXCLUDED.clothing_type,
                updated_at = NOW()
            ",
        )
        .bind(&category.id)
        .bind(&category.store_id)
        .bind(&category.name)
        .bind(i16::from(u8::from(category.type_of_clothing)))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete a category. Products keep their category id and fall back to
    /// an unknown clothing class.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: &CategoryId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM catalog.category WHERE contentful_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
