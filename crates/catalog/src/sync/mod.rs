//! Webhook decisions, free of I/O.
//!
//! A webhook handler loads the rows a payload refers to, asks this module
//! what the payload does to them, and writes the result back. Keeping the
//! decisions pure lets every branch be tested without a database.
//!
//! A product is served only while it has both halves: store data from
//! Shopify or WooCommerce and a content link from Contentful. Losing one
//! half disables the product; losing the last half deletes it.

pub mod contentful;
pub mod shopify;
pub mod woocommerce;

use modamatch_core::{ClothingType, ExternalProductId, Platform, Product, ProductId};
use uuid::Uuid;

/// What a store product webhook asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Upsert,
    Remove,
}

impl StoreEvent {
    /// Classify a store topic. A draft is removed whatever the topic.
    #[must_use]
    pub fn classify(
        topic: &str,
        status: Option<&str>,
        upsert_topics: &[&str],
        remove_topics: &[&str],
    ) -> Option<Self> {
        let is_draft = status == Some("draft");
        if upsert_topics.contains(&topic) && !is_draft {
            Some(Self::Upsert)
        } else if remove_topics.contains(&topic) || is_draft {
            Some(Self::Remove)
        } else {
            None
        }
    }
}

/// Outcome of applying a webhook to one cached product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Save(Box<Product>),
    Delete(ProductId),
    Skip,
}

/// An empty product row for a store product seen for the first time.
#[must_use]
pub fn new_product(platform: Platform, shop_name: &str, external_id: ExternalProductId) -> Product {
    Product {
        id: ProductId::new(Uuid::new_v4().to_string()),
        shop_name: shop_name.to_owned(),
        platform,
        external_id,
        title: None,
        description: None,
        short_description: None,
        price: None,
        image_url: None,
        main_image_url: None,
        additional_images: Vec::new(),
        contentful_id: None,
        category_id: None,
        clothing_type: ClothingType::Unknown,
        enabled: false,
        store_data: None,
    }
}

/// Recompute `enabled` after either half changed.
pub fn refresh_enabled(product: &mut Product) {
    product.enabled = product.store_data.is_some() && product.contentful_id.is_some();
}

/// Drop the store half of a product.
#[must_use]
pub fn remove_store_data(existing: Option<Product>) -> SyncAction {
    let Some(mut product) = existing else {
        return SyncAction::Skip;
    };
    if product.contentful_id.is_none() {
        return SyncAction::Delete(product.id);
    }

    product.title = None;
    product.price = None;
    product.image_url = None;
    product.description = None;
    product.short_description = None;
    product.store_data = None;
    product.enabled = false;
    SyncAction::Save(Box::new(product))
}

/// Drop the content half of a product.
#[must_use]
pub fn unlink_content(mut product: Product) -> SyncAction {
    if product.store_data.is_none() {
        return SyncAction::Delete(product.id);
    }

    product.contentful_id = None;
    product.category_id = None;
    product.enabled = false;
    SyncAction::Save(Box::new(product))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use modamatch_core::{ContentfulId, StoreData};

    use super::*;

    pub fn linked(store_data: bool) -> Product {
        let mut product = new_product(Platform::Shopify, "acme", ExternalProductId::new(7));
        product.title = Some("Linen shirt".to_owned());
        product.contentful_id = Some(ContentfulId::new("item-1"));
        product.store_data = store_data.then(StoreData::default);
        refresh_enabled(&mut product);
        product
    }
}
