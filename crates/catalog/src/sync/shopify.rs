//! Shopify product webhooks (`products/create`, `products/update`, `products/delete`).

use serde::Deserialize;

use modamatch_core::{
    ExternalProductId, Platform, Price, Product, ProductOption, StoreData, Variant, VariantId,
};

use super::{StoreEvent, new_product, refresh_enabled};

pub const UPSERT_TOPICS: &[&str] = &["products/create", "products/update"];
pub const REMOVE_TOPICS: &[&str] = &["products/delete"];

/// Product payload as Shopify posts it. Delete payloads carry only `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyProduct {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub image: Option<ShopifyImage>,
    #[serde(default)]
    pub options: Vec<ShopifyOption>,
    #[serde(default)]
    pub variants: Vec<ShopifyVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyImage {
    pub src: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyOption {
    pub name: String,
    pub position: u8,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyVariant {
    pub id: i64,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub option1: Option<String>,
    #[serde(default)]
    pub option2: Option<String>,
    #[serde(default)]
    pub option3: Option<String>,
}

impl ShopifyProduct {
    #[must_use]
    pub fn event(&self, topic: &str) -> Option<StoreEvent> {
        StoreEvent::classify(topic, self.status.as_deref(), UPSERT_TOPICS, REMOVE_TOPICS)
    }

    #[must_use]
    pub const fn external_id(&self) -> ExternalProductId {
        ExternalProductId::new(self.id)
    }

    /// Merge the payload into the cached product, creating it if needed.
    /// The content link is left untouched.
    #[must_use]
    pub fn apply(&self, existing: Option<Product>, shop_name: &str) -> Product {
        let mut product = existing
            .unwrap_or_else(|| new_product(Platform::Shopify, shop_name, self.external_id()));

        product.title.clone_from(&self.title);
        product.description.clone_from(&self.body_html);
        product.price = self
            .variants
            .first()
            .and_then(|variant| variant.price.as_deref())
            .and_then(Price::parse_major);
        product.image_url = self.image.as_ref().map(|image| image.src.clone());
        product.store_data = Some(self.store_data());
        refresh_enabled(&mut product);
        product
    }

    fn store_data(&self) -> StoreData {
        StoreData {
            options: self
                .options
                .iter()
                .map(|option| ProductOption {
                    name: option.name.clone(),
                    position: option.position,
                    values: option.values.clone(),
                })
                .collect(),
            variants: self
                .variants
                .iter()
                .map(|variant| Variant {
                    id: VariantId::new(variant.id),
                    product_id: variant.product_id.map(ExternalProductId::new),
                    title: variant.title.clone(),
                    price: variant.price.as_deref().and_then(Price::parse_major),
                    option1: variant.option1.clone(),
                    option2: variant.option2.clone(),
                    option3: variant.option3.clone(),
                })
                .collect(),
        }
    }
}
