//! Unified error handling with Sentry integration.
//!
//! API routes return [`ApiError`], which answers with a
//! `{errorCode, errorMessage}` body. Webhook routes return [`WebhookError`],
//! which answers in plain text the way store platforms log it. Both capture
//! server errors to Sentry and never expose database details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Error type for the JSON API routes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Query parameters are missing or malformed.
    #[error("{0}")]
    InvalidParameters(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_code: &'static str,
    error_message: String,
}

impl ApiError {
    /// Stable error code reported to clients.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameters(_) => "InvalidParameters",
            Self::NotFound(_) => "NotFound",
            Self::Database(_) => "UnexpectedError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let error_message = match &self {
            Self::Database(_) => UNEXPECTED_ERROR.to_string(),
            _ => self.to_string(),
        };

        let body = ErrorBody {
            error_code: self.code(),
            error_message,
        };
        (status, Json(body)).into_response()
    }
}

/// Error type for the webhook routes.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Error in parsing req.body")]
    MalformedBody(#[source] serde_json::Error),

    #[error("Invalid or Missing shop name")]
    MissingShopName,

    #[error("HMAC validation failed")]
    SignatureMismatch,

    #[error("Invalid webhook secret")]
    InvalidSecret,

    #[error("Invalid webhook event")]
    InvalidEvent(String),

    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match &self {
            Self::Database(_) => {
                let event_id = sentry::capture_error(&self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Webhook error"
                );
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::InvalidEvent(topic) => {
                tracing::info!(%topic, "Invalid webhook event");
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            _ => {
                tracing::warn!(error = %self, "Webhook rejected");
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
        }
    }
}
