//! Webhook signing for local testing.
//!
//! Produces the value a store would send in `x-shopify-hmac-sha256` or
//! `x-wc-webhook-signature` for a given body, so requests can be replayed
//! against a catalog instance with curl.

use std::path::Path;

use modamatch_catalog::webhook::sign;

/// Sign the exact bytes of `file` with `secret`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the key is rejected.
pub async fn sign_file(secret: &str, file: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if secret.is_empty() {
        return Err("Secret must not be empty".into());
    }

    let body = tokio::fs::read(file).await?;
    tracing::info!(path = %file.display(), bytes = body.len(), "Signing webhook body");
    let signature =
        sign(secret.as_bytes(), &body).map_err(|e| format!("Invalid secret: {e}"))?;
    Ok(signature)
}
