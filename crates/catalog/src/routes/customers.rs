//! Shopper feedback and preferences sent by the widget.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::db::{CustomerPreference, FeedbackRepository, NewFeedback, PreferenceRepository};
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /api/customer/feedback`. Every field is required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackForm {
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub feedback_value: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl FeedbackForm {
    fn validate(self) -> Result<NewFeedback, ApiError> {
        let required = |value: Option<String>| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ApiError::InvalidParameters("All values must be provided".to_string()))
        };
        Ok(NewFeedback {
            store_id: required(self.store_id)?,
            feedback_value: required(self.feedback_value)?,
            email: required(self.email)?,
            message: required(self.message)?,
        })
    }
}

/// Query string of the preference routes.
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: Option<String>,
}

impl EmailQuery {
    fn email(&self) -> Result<&str, ApiError> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| ApiError::InvalidParameters("Email must be provided".to_string()))
    }
}

/// Body of `POST /api/customer/preferences`.
#[derive(Debug, Default, Deserialize)]
pub struct PreferenceUpdate {
    #[serde(default)]
    pub model: Option<u32>,
}

/// `POST /api/customer/feedback`
#[instrument(skip(state, form))]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(form): Json<FeedbackForm>,
) -> Result<Json<Value>, ApiError> {
    let feedback = form.validate()?;
    let id = FeedbackRepository::new(state.pool()).insert(&feedback).await?;
    tracing::info!(id, store_id = %feedback.store_id, "Stored shopper feedback");
    Ok(Json(Value::Null))
}

/// `GET /api/customer/preferences?email=`
#[instrument(skip(state, query))]
pub async fn get_preferences(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<CustomerPreference>, ApiError> {
    let email = query.email()?;
    PreferenceRepository::new(state.pool())
        .get(email)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No preferences saved".to_string()))
}

/// `POST /api/customer/preferences?email=`
///
/// Creates the shopper's row on first use; a missing `model` keeps the
/// saved one.
#[instrument(skip(state, query, update))]
pub async fn save_preferences(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
    Json(update): Json<PreferenceUpdate>,
) -> Result<Json<Value>, ApiError> {
    let email = query.email()?;
    let model = update
        .model
        .map(i32::try_from)
        .transpose()
        .map_err(|_| ApiError::InvalidParameters("Invalid model".to_string()))?;

    PreferenceRepository::new(state.pool()).save(email, model).await?;
    Ok(Json(Value::Null))
}
