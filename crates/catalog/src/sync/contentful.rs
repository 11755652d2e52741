//! Contentful management webhooks for `item`, `category` and `store` entries.
//!
//! Entry fields arrive localized (`{"en-US": value}`); the first locale
//! present is used. Links to other entries only carry their id.

use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value};

use modamatch_core::{
    Category, CategoryId, ClothingType, ContentfulId, ExternalProductId, Platform, Product,
};

use super::{new_product, refresh_enabled};

const PUBLISH_TOPICS: &[&str] = &[
    "ContentManagement.Entry.publish",
    "ContentManagement.Entry.unarchive",
    "ContentManagement.Entry.create",
    "ContentManagement.Entry.save",
    "ContentManagement.Entry.auto_save",
];
const UNPUBLISH_TOPICS: &[&str] = &[
    "ContentManagement.Entry.unpublish",
    "ContentManagement.Entry.archive",
    "ContentManagement.Entry.delete",
];

/// What a content webhook asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEvent {
    Publish,
    Unpublish,
}

impl ContentEvent {
    #[must_use]
    pub fn classify(topic: &str) -> Option<Self> {
        if PUBLISH_TOPICS.contains(&topic) {
            Some(Self::Publish)
        } else if UNPUBLISH_TOPICS.contains(&topic) {
            Some(Self::Unpublish)
        } else {
            None
        }
    }
}

/// Content type of the entry a webhook is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    Item,
    Category,
    Store,
    Other(String),
}

/// Entry payload as Contentful posts it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub sys: EntrySys,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySys {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content_type: Option<Value>,
}

/// A published item's link to a store product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLink {
    pub entry_id: ContentfulId,
    pub external_id: ExternalProductId,
    /// Entry id of the item's store
    pub store_entry_id: ContentfulId,
    pub category_id: Option<CategoryId>,
    pub main_image_url: Option<String>,
    pub additional_images: Vec<String>,
}

/// A published store entry.
#[derive(Clone)]
pub struct StoreEntry {
    pub entry_id: ContentfulId,
    pub shop_name: String,
    pub platform: Platform,
    pub enabled: bool,
    pub secret_key: SecretString,
}

impl std::fmt::Debug for StoreEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEntry")
            .field("entry_id", &self.entry_id)
            .field("shop_name", &self.shop_name)
            .field("platform", &self.platform)
            .field("enabled", &self.enabled)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Why an item entry cannot be linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSkip {
    /// The entry is not tied to a store product.
    NoProductId,
    /// The product id or store link is missing or unreadable.
    NoStore,
}

impl Entry {
    #[must_use]
    pub fn entry_id(&self) -> Option<ContentfulId> {
        self.sys.id.as_deref().map(ContentfulId::new)
    }

    /// Content type id; entries that do not say are treated as items.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        let id = self
            .sys
            .content_type
            .as_ref()
            .and_then(|link| link.pointer("/sys/id"))
            .and_then(Value::as_str);
        match id {
            None | Some("item") => ContentType::Item,
            Some("category") => ContentType::Category,
            Some("store") => ContentType::Store,
            Some(other) => ContentType::Other(other.to_owned()),
        }
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).and_then(first_locale)
    }

    fn text(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn link_id(&self, name: &str) -> Option<String> {
        self.field(name)?
            .pointer("/sys/id")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    /// Read an `item` entry's product link.
    ///
    /// # Errors
    ///
    /// Returns the reason the entry cannot be linked to a product.
    pub fn item_link(&self) -> Result<ItemLink, ItemSkip> {
        let entry_id = self.entry_id().ok_or(ItemSkip::NoStore)?;
        let raw_product_id = self.text("shopifyId").ok_or(ItemSkip::NoProductId)?;
        let external_id = raw_product_id
            .parse::<i64>()
            .ok()
            .filter(|id| *id != 0)
            .ok_or(ItemSkip::NoStore)?;
        let store_entry_id = self.link_id("store").ok_or(ItemSkip::NoStore)?;

        let main_image_url = self.field("mainThumbnail").and_then(asset_url);
        let additional_images = self
            .field("additionalPhotos")
            .and_then(Value::as_array)
            .map(|photos| photos.iter().filter_map(asset_url).collect())
            .unwrap_or_default();

        Ok(ItemLink {
            entry_id,
            external_id: ExternalProductId::new(external_id),
            store_entry_id: ContentfulId::new(store_entry_id),
            category_id: self.link_id("category").map(CategoryId::new),
            main_image_url,
            additional_images,
        })
    }

    /// Read a `category` entry.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        let id = self.sys.id.as_deref()?;
        let type_of_clothing = self
            .field("typeOfClothing")
            .and_then(Value::as_u64)
            .and_then(|n| u8::try_from(n).ok())
            .map_or(ClothingType::Unknown, ClothingType::from);

        Some(Category {
            id: CategoryId::new(id),
            store_id: self.text("storeId").unwrap_or_default(),
            name: self.text("category").unwrap_or_default(),
            type_of_clothing,
        })
    }

    /// Read a `store` entry. Entries without a store id or secret are ignored.
    #[must_use]
    pub fn store(&self) -> Option<StoreEntry> {
        let is_shopify = self
            .field("storeType")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Some(StoreEntry {
            entry_id: self.entry_id()?,
            shop_name: self.text("storeId")?,
            platform: if is_shopify {
                Platform::Shopify
            } else {
                Platform::Woocommerce
            },
            enabled: self
                .field("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            secret_key: SecretString::from(self.text("secretKey")?),
        })
    }
}

impl ItemLink {
    /// Link the item to its product, creating the product row if the store
    /// webhook has not arrived yet.
    #[must_use]
    pub fn apply(&self, existing: Option<Product>, platform: Platform, shop_name: &str) -> Product {
        let mut product =
            existing.unwrap_or_else(|| new_product(platform, shop_name, self.external_id));

        product.contentful_id = Some(self.entry_id.clone());
        product.category_id.clone_from(&self.category_id);
        if let Some(main) = &self.main_image_url {
            product.main_image_url = Some(main.clone());
            product.additional_images = std::iter::once(main.clone())
                .chain(self.additional_images.iter().cloned())
                .collect();
        }
        refresh_enabled(&mut product);
        product
    }
}

fn first_locale(value: &Value) -> Option<&Value> {
    value.as_object()?.values().next()
}

/// URL of a resolved asset, localized or not. Bare links have none.
fn asset_url(asset: &Value) -> Option<String> {
    let file = asset.pointer("/fields/file")?;
    let url = file
        .get("url")
        .or_else(|| first_locale(file).and_then(|f| f.get("url")))?;
    url.as_str().map(str::to_owned)
}
