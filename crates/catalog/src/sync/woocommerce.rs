//! WooCommerce product webhooks (`created`, `updated`, `deleted`).
//!
//! WooCommerce posts variations as products of their own with a non-zero
//! `parent_id`. They are not cached as rows; each one is merged into its
//! parent's variant list instead.

use serde::Deserialize;

use modamatch_core::{
    ExternalProductId, Platform, Price, Product, ProductOption, StoreData, Variant, VariantId,
};

use super::{StoreEvent, SyncAction, new_product, refresh_enabled};

pub const UPSERT_EVENTS: &[&str] = &["created", "updated"];
pub const REMOVE_EVENTS: &[&str] = &["deleted"];

/// Product or variation payload as WooCommerce posts it.
#[derive(Debug, Clone, Deserialize)]
pub struct WooProduct {
    pub id: i64,
    #[serde(default)]
    pub parent_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub images: Vec<WooImage>,
    #[serde(default)]
    pub attributes: Vec<WooAttribute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WooImage {
    pub src: String,
}

/// A product attribute (`options`) or a variation's chosen value (`option`).
#[derive(Debug, Clone, Deserialize)]
pub struct WooAttribute {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub option: Option<String>,
}

impl WooProduct {
    #[must_use]
    pub fn event(&self, event: &str) -> Option<StoreEvent> {
        StoreEvent::classify(event, self.status.as_deref(), UPSERT_EVENTS, REMOVE_EVENTS)
    }

    #[must_use]
    pub const fn is_variation(&self) -> bool {
        self.parent_id != 0
    }

    #[must_use]
    pub const fn external_id(&self) -> ExternalProductId {
        ExternalProductId::new(self.id)
    }

    #[must_use]
    pub const fn parent_external_id(&self) -> ExternalProductId {
        ExternalProductId::new(self.parent_id)
    }

    fn price(&self) -> Option<Price> {
        self.price.as_deref().and_then(Price::parse_major)
    }

    /// Merge a parent product into the cached row, creating it if needed.
    ///
    /// Variations merged earlier are kept; a product without any gets a
    /// single variant carrying its own id.
    #[must_use]
    pub fn apply_product(&self, existing: Option<Product>, shop_name: &str) -> Product {
        let mut product = existing
            .unwrap_or_else(|| new_product(Platform::Woocommerce, shop_name, self.external_id()));

        product.title.clone_from(&self.name);
        product.price = self.price();
        product.image_url = self.images.first().map(|image| image.src.clone());
        product.description.clone_from(&self.description);
        product.short_description.clone_from(&self.short_description);

        let variants = product
            .store_data
            .take()
            .map(|data| data.variants)
            .filter(|variants| !variants.is_empty())
            .unwrap_or_else(|| vec![self.own_variant()]);
        product.store_data = Some(StoreData {
            options: self.options(),
            variants,
        });
        refresh_enabled(&mut product);
        product
    }

    /// Merge a variation into its parent's variant list.
    ///
    /// Skipped when the parent is unknown or has no store data yet.
    #[must_use]
    pub fn apply_variation(&self, parent: Option<Product>) -> SyncAction {
        let Some(mut product) = parent else {
            return SyncAction::Skip;
        };
        let parent_variant = VariantId::new(product.external_id.as_i64());
        let Some(data) = product.store_data.as_mut() else {
            return SyncAction::Skip;
        };

        let variant = self.variation(&data.options);
        data.variants
            .retain(|v| v.id != variant.id && v.id != parent_variant);
        data.variants.push(variant);

        refresh_enabled(&mut product);
        SyncAction::Save(Box::new(product))
    }

    fn options(&self) -> Vec<ProductOption> {
        self.attributes
            .iter()
            .enumerate()
            .map(|(index, attribute)| ProductOption {
                name: attribute.name.clone(),
                position: slot_for_index(index),
                values: attribute.options.clone(),
            })
            .collect()
    }

    fn own_variant(&self) -> Variant {
        Variant {
            id: VariantId::new(self.id),
            product_id: Some(self.external_id()),
            title: None,
            price: self.price(),
            option1: None,
            option2: None,
            option3: None,
        }
    }

    /// Variation values land in the slot of the parent option with the
    /// same name, or in list order when the parent does not declare it.
    fn variation(&self, parent_options: &[ProductOption]) -> Variant {
        let mut variant = Variant {
            id: VariantId::new(self.id),
            product_id: Some(self.parent_external_id()),
            title: self.name.clone(),
            price: self.price(),
            option1: None,
            option2: None,
            option3: None,
        };

        for (index, attribute) in self.attributes.iter().enumerate() {
            let Some(value) = attribute.option.clone() else {
                continue;
            };
            let slot = parent_options
                .iter()
                .find(|option| option.name.eq_ignore_ascii_case(&attribute.name))
                .map_or_else(|| slot_for_index(index), |option| option.position);

            match slot {
                1 => variant.option1 = Some(value),
                2 => variant.option2 = Some(value),
                3 => variant.option3 = Some(value),
                _ => {}
            }
        }
        variant
    }
}

fn slot_for_index(index: usize) -> u8 {
    u8::try_from(index + 1).unwrap_or(u8::MAX)
}
