//! Shopify storefront strategy (Ajax cart API).

use async_trait::async_trait;
use modamatch_core::protocol::LineItem;
use modamatch_core::{Currency, CustomerData, Platform};
use serde_json::{Value, json};
use url::Url;

use super::{HostPlatform, PageContext, site_path};
use crate::error::HostError;

/// Shopify theme pages: `POST /cart/add.js` with all lines in one request.
#[derive(Debug, Clone)]
pub struct ShopifyPlatform {
    client: reqwest::Client,
    site_url: Url,
    page: PageContext,
}

impl ShopifyPlatform {
    #[must_use]
    pub const fn new(client: reqwest::Client, site_url: Url, page: PageContext) -> Self {
        Self {
            client,
            site_url,
            page,
        }
    }
}

#[async_trait]
impl HostPlatform for ShopifyPlatform {
    fn platform(&self) -> Platform {
        Platform::Shopify
    }

    fn customer(&self) -> CustomerData {
        self.page.customer()
    }

    fn currency(&self) -> Currency {
        self.page.currency()
    }

    #[tracing::instrument(skip(self, items), fields(lines = items.len()))]
    async fn add_to_cart(&self, items: &[LineItem]) -> Result<Value, HostError> {
        let url = site_path(&self.site_url, "cart/add.js")?;

        let response = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(&json!({ "items": items }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        // Shopify answers with JSON; keep the raw text if it ever does not.
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if status.is_client_error() || status.is_server_error() {
            tracing::warn!(status = status.as_u16(), "Shopify rejected cart add");
            return Err(HostError::HostOperationFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn checkout_url(&self) -> Result<Url, HostError> {
        site_path(&self.site_url, "checkout")
    }
}
