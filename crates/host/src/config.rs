//! Host bridge configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MODAMATCH_EMBED_ORIGIN` - Origin of the embedded widget, `{protocol}://{host}`
//! - `MODAMATCH_SITE_URL` - Public URL of the store the bridge runs on
//!
//! ## Optional
//! - `MODAMATCH_PLATFORM` - `shopify` or `woocommerce` (default: shopify)
//! - `MODAMATCH_SHOP_ID` - Shop id attached to overlay analytics events

use modamatch_core::Platform;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Host bridge configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Only frames from exactly this origin are handled
    pub embed_origin: String,
    /// Store platform whose native cart the bridge drives
    pub platform: Platform,
    /// Public store URL, without trailing slash
    pub site_url: Url,
    /// Shop id reported with overlay open/close events
    pub shop_id: Option<String>,
}

impl HostConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let embed_origin = parse_origin(&get_required_env("MODAMATCH_EMBED_ORIGIN")?)?;
        let platform = get_env_or_default("MODAMATCH_PLATFORM", "shopify")
            .parse::<Platform>()
            .map_err(|e| ConfigError::InvalidEnvVar("MODAMATCH_PLATFORM".to_string(), e))?;
        let site_url = get_required_env("MODAMATCH_SITE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MODAMATCH_SITE_URL".to_string(), e.to_string())
            })?;
        let shop_id = std::env::var("MODAMATCH_SHOP_ID").ok();

        Ok(Self {
            embed_origin,
            platform,
            site_url,
            shop_id,
        })
    }
}

/// Validate that `value` is a bare origin and return it unchanged.
///
/// Frames are matched against this string exactly, so a trailing slash or
/// path would silently reject every frame.
fn parse_origin(value: &str) -> Result<String, ConfigError> {
    let invalid =
        |reason: String| ConfigError::InvalidEnvVar("MODAMATCH_EMBED_ORIGIN".to_string(), reason);

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    let origin = url.origin().ascii_serialization();
    if origin != value {
        return Err(invalid(format!("expected a bare origin like {origin}")));
    }
    Ok(origin)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
