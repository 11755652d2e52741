//! Shopper feedback and preference repositories.

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::RepositoryError;

/// Feedback submitted from the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub store_id: String,
    pub feedback_value: String,
    pub email: String,
    pub message: String,
}

/// Repository for shopper feedback.
pub struct FeedbackRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FeedbackRepository<'a> {
    /// Create a new feedback repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a feedback entry and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(&self, feedback: &NewFeedback) -> Result<i64, RepositoryError> {
        let id = sqlx::query_scalar::<_, i64>(
            r"
            INSERT INTO catalog.feedback (store_id, feedback_value, email, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&feedback.store_id)
        .bind(&feedback.feedback_value)
        .bind(&feedback.email)
        .bind(&feedback.message)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}

/// A shopper's saved preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerPreference {
    pub email: String,
    /// Chosen model index, if the shopper picked one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<u32>,
}

#[derive(FromRow)]
struct PreferenceRow {
    email: String,
    model: Option<i32>,
}

impl TryFrom<PreferenceRow> for CustomerPreference {
    type Error = RepositoryError;

    fn try_from(row: PreferenceRow) -> Result<Self, Self::Error> {
        let model = row
            .model
            .map(u32::try_from)
            .transpose()
            .map_err(|_| RepositoryError::DataCorruption(format!("negative model for {}", row.email)))?;
        Ok(Self {
            email: row.email,
            model,
        })
    }
}

/// Repository for shopper preferences.
pub struct PreferenceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PreferenceRepository<'a> {
    /// Create a new preference repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the preferences saved for `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, email: &str) -> Result<Option<CustomerPreference>, RepositoryError> {
        let row = sqlx::query_as::<_, PreferenceRow>(
            "SELECT email, model FROM catalog.customer_preference WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(CustomerPreference::try_from).transpose()
    }

    /// Create the row for `email` if needed and set `model` when given.
    ///
    /// A `None` model keeps whatever was saved before.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, email: &str, model: Option<i32>) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO catalog.customer_preference (email, model)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET
                model = COALESCE(EXCLUDED.model, catalog.customer_preference.model),
                updated_at = NOW()
            ",
        )
        .bind(email)
        .bind(model)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
