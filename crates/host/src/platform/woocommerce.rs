//! WooCommerce strategy (`?add-to-cart=` links).
//!
//! WooCommerce has no batch cart endpoint for anonymous shoppers, so each
//! line is a separate request. Lines are sent in order and the first
//! failure stops the batch.

use async_trait::async_trait;
use modamatch_core::protocol::LineItem;
use modamatch_core::{Currency, CustomerData, Platform};
use serde_json::{Value, json};
use url::Url;

use super::{HostPlatform, PageContext, site_path};
use crate::error::HostError;

/// WooCommerce sites with the "Post name" permalink structure.
#[derive(Debug, Clone)]
pub struct WooCommercePlatform {
    client: reqwest::Client,
    site_url: Url,
    page: PageContext,
}

impl WooCommercePlatform {
    #[must_use]
    pub const fn new(client: reqwest::Client, site_url: Url, page: PageContext) -> Self {
        Self {
            client,
            site_url,
            page,
        }
    }

    fn add_to_cart_url(&self, item: &LineItem) -> Result<Url, HostError> {
        let mut url = site_path(&self.site_url, "cart/")?;
        url.query_pairs_mut()
            .append_pair("add-to-cart", &item.id.to_string())
            .append_pair("quantity", &item.quantity.to_string());
        Ok(url)
    }
}

#[async_trait]
impl HostPlatform for WooCommercePlatform {
    fn platform(&self) -> Platform {
        Platform::Woocommerce
    }

    fn customer(&self) -> CustomerData {
        self.page.customer()
    }

    fn currency(&self) -> Currency {
        self.page.currency()
    }

    /// Returns the HTTP status of the last line added, or `null` for no lines.
    #[tracing::instrument(skip(self, items), fields(lines = items.len()))]
    async fn add_to_cart(&self, items: &[LineItem]) -> Result<Value, HostError> {
        let mut last_status = Value::Null;

        for item in items {
            let response = self.client.get(self.add_to_cart_url(item)?).send().await?;
            let status = response.status();

            if status.is_client_error() || status.is_server_error() {
                tracing::warn!(
                    status = status.as_u16(),
                    variant_id = %item.id,
                    "WooCommerce rejected cart add"
                );
                return Err(HostError::HostOperationFailed {
                    status: status.as_u16(),
                    body: json!({
                        "message": format!("Add to cart responded with code {}", status.as_u16()),
                    }),
                });
            }
            last_status = json!(status.as_u16());
        }

        Ok(last_status)
    }

    fn checkout_url(&self) -> Result<Url, HostError> {
        site_path(&self.site_url, "checkout/")
    }
}
