//! Host-side error types.

use modamatch_core::protocol::ProtocolError;
use serde_json::{Value, json};
use thiserror::Error;

/// Errors raised while handling a widget request.
#[derive(Debug, Error)]
pub enum HostError {
    /// The store's native API answered with a 4xx/5xx status.
    #[error("Host operation failed with status {status}")]
    HostOperationFailed { status: u16, body: Value },

    /// The store's native API could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A frame came from a window other than the embedded widget.
    #[error("Rejected frame from origin {0}")]
    OriginRejected(String),

    /// The request could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The configured site URL cannot be used to build store URLs.
    #[error("Invalid site URL: {0}")]
    InvalidSiteUrl(#[from] url::ParseError),
}

impl HostError {
    /// Payload sent back to the widget with `isError`.
    ///
    /// Store failures pass the store's own error body through unchanged.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::HostOperationFailed { body, .. } => body.clone(),
            other => json!({ "message": other.to_string() }),
        }
    }
}
