//! Webhook authentication.
//!
//! Shopify and WooCommerce sign the raw request body with HMAC-SHA256 and
//! send the base64 digest in a header. Contentful sends a shared secret.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::WebhookError;

pub const SHOPIFY_TOPIC: &str = "x-shopify-topic";
pub const SHOPIFY_SIGNATURE: &str = "x-shopify-hmac-sha256";
pub const SHOPIFY_SHOP_DOMAIN: &str = "x-shopify-shop-domain";
pub const WOOCOMMERCE_EVENT: &str = "x-wc-webhook-event";
pub const WOOCOMMERCE_SIGNATURE: &str = "x-wc-webhook-signature";
pub const CONTENTFUL_TOPIC: &str = "x-contentful-topic";
pub const CONTENTFUL_SECRET: &str = "webhook-secret";

/// Base64 HMAC-SHA256 of `body` under `secret`.
///
/// # Errors
///
/// Returns `InvalidLength` if the key is rejected.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verify a store webhook signature.
///
/// # Errors
///
/// Returns `WebhookError::SignatureMismatch` unless `signature` is the
/// body's digest under `secret`.
pub fn verify_signature(
    secret: &SecretString,
    body: &[u8],
    signature: &str,
) -> Result<(), WebhookError> {
    let expected = sign(secret.expose_secret().as_bytes(), body)
        .map_err(|_| WebhookError::SignatureMismatch)?;
    if constant_time_compare(&expected, signature.trim()) {
        Ok(())
    } else {
        Err(WebhookError::SignatureMismatch)
    }
}

/// Verify the shared secret a content webhook carries.
///
/// # Errors
///
/// Returns `WebhookError::InvalidSecret` when the header is missing or wrong.
pub fn verify_shared_secret(
    expected: &SecretString,
    provided: Option<&str>,
) -> Result<(), WebhookError> {
    match provided {
        Some(provided) if constant_time_compare(expected.expose_secret(), provided) => Ok(()),
        _ => Err(WebhookError::InvalidSecret),
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
