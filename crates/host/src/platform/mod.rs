//! Store platform strategies.
//!
//! The set of widget operations is the same on every store; what differs is
//! where the page exposes the customer and currency and which native cart
//! endpoint adds line items. One strategy is chosen when the bridge is
//! built and stays fixed for its lifetime.

mod shopify;
mod woocommerce;

use std::sync::Arc;

use async_trait::async_trait;
use modamatch_core::protocol::LineItem;
use modamatch_core::{Currency, CustomerData, Platform};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::HostError;

pub use shopify::ShopifyPlatform;
pub use woocommerce::WooCommercePlatform;

/// Values the store theme injects into the page for the widget.
///
/// Anything the theme did not expose is `None` and falls back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub currency_rate: Option<String>,
}

impl PageContext {
    /// Customer as exposed by the page, with the default locale when unset.
    #[must_use]
    pub fn customer(&self) -> CustomerData {
        let defaults = CustomerData::default();
        CustomerData {
            id: self.customer_id.clone(),
            email: self.customer_email.clone(),
            locale: non_empty(self.locale.as_deref()).map_or(defaults.locale, str::to_owned),
        }
    }

    /// Currency as exposed by the page, or USD at 1.0 when the code is unset.
    #[must_use]
    pub fn currency(&self) -> Currency {
        let Some(active) = non_empty(self.currency_code.as_deref()) else {
            return Currency::default();
        };
        Currency {
            active: active.to_owned(),
            rate: non_empty(self.currency_rate.as_deref()).unwrap_or("1.0").to_owned(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A store platform's native page and cart operations.
#[async_trait]
pub trait HostPlatform: Send + Sync {
    fn platform(&self) -> Platform;

    /// Customer identity for `getCustomer`.
    fn customer(&self) -> CustomerData;

    /// Active currency for `getCurrency`.
    fn currency(&self) -> Currency;

    /// Add line items to the store's native cart.
    ///
    /// Returns the store's response body, passed through to the widget.
    async fn add_to_cart(&self, items: &[LineItem]) -> Result<Value, HostError>;

    /// Where to send the shopper for checkout.
    fn checkout_url(&self) -> Result<Url, HostError>;
}

/// Build the strategy for `platform`.
///
/// # Errors
///
/// Returns `HostError::Http` if the HTTP client cannot be built.
pub fn for_platform(
    platform: Platform,
    site_url: Url,
    page: PageContext,
) -> Result<Arc<dyn HostPlatform>, HostError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("modamatch-host/", env!("CARGO_PKG_VERSION")))
        .build()?;

    Ok(match platform {
        Platform::Shopify => Arc::new(ShopifyPlatform::new(client, site_url, page)),
        Platform::Woocommerce => Arc::new(WooCommercePlatform::new(client, site_url, page)),
    })
}

/// Join `path` onto the site URL, keeping any path prefix the site lives under.
pub(crate) fn site_path(site_url: &Url, path: &str) -> Result<Url, HostError> {
    let base = site_url.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?)
}
