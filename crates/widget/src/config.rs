//! Widget configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `MODAMATCH_STORE_ID` - Store the widget is embedded in; unset outside a host page
//! - `MODAMATCH_MESSENGER_TIMEOUT_MS` - Host response deadline (default: 10000)
//! - `MODAMATCH_SETTINGS_DIR` - Directory for persisted settings (default: .modamatch)

use std::path::PathBuf;
use std::time::Duration;

use modamatch_core::StoreId;
use thiserror::Error;

use crate::messenger::DEFAULT_TIMEOUT;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Widget runtime configuration.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Store the widget is embedded in
    pub store_id: Option<StoreId>,
    /// How long to wait for the host page to answer
    pub messenger_timeout: Duration,
    /// Where shopper settings are persisted
    pub settings_dir: PathBuf,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            store_id: None,
            messenger_timeout: DEFAULT_TIMEOUT,
            settings_dir: PathBuf::from(".modamatch"),
        }
    }
}

impl WidgetConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let store_id = std::env::var("MODAMATCH_STORE_ID")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(StoreId::new);

        let messenger_timeout = match std::env::var("MODAMATCH_MESSENGER_TIMEOUT_MS") {
            Ok(value) => parse_timeout(&value)?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        let settings_dir = std::env::var("MODAMATCH_SETTINGS_DIR")
            .map_or_else(|_| PathBuf::from(".modamatch"), PathBuf::from);

        Ok(Self {
            store_id,
            messenger_timeout,
            settings_dir,
        })
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let millis = value.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("MODAMATCH_MESSENGER_TIMEOUT_MS".to_string(), e.to_string())
    })?;
    if millis == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "MODAMATCH_MESSENGER_TIMEOUT_MS".to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_millis(millis))
}
