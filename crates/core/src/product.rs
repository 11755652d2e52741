//! Product snapshots shared by the catalog service and the widget.
//!
//! A [`Product`] is the denormalized record the catalog keeps for every store
//! product: the store's own data (options and variants) merged with the
//! content-store item it is linked to. Fitting and cart items embed a copy of
//! it so the widget can render without refetching.

use serde::{Deserialize, Serialize};

use crate::types::{
    CategoryId, ClothingType, ContentfulId, ExternalProductId, Price, ProductId, VariantId,
};

/// Store platform a product belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Shopify,
    Woocommerce,
}

impl Platform {
    /// Lowercase name used in URLs and the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shopify => "shopify",
            Self::Woocommerce => "woocommerce",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shopify" => Ok(Self::Shopify),
            "woocommerce" => Ok(Self::Woocommerce),
            _ => Err(format!("Invalid platform: {s}")),
        }
    }
}

/// A cached store product, hydrated with its content-store link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub shop_name: String,
    pub platform: Platform,
    pub external_id: ExternalProductId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    /// Price of the first variant.
    #[serde(default)]
    pub price: Option<Price>,
    /// Store-side product image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Content-store thumbnail, preferred over `image_url` when present.
    #[serde(default)]
    pub main_image_url: Option<String>,
    #[serde(default)]
    pub additional_images: Vec<String>,
    #[serde(default)]
    pub contentful_id: Option<ContentfulId>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub clothing_type: ClothingType,
    #[serde(default)]
    pub enabled: bool,
    /// Store options and variants; `None` once the store product is deleted.
    #[serde(default)]
    pub store_data: Option<StoreData>,
}

impl Product {
    /// Declared options, empty when no store data is cached.
    #[must_use]
    pub fn options(&self) -> &[ProductOption] {
        self.store_data
            .as_ref()
            .map_or(&[], |data| data.options.as_slice())
    }

    /// Purchasable variants, empty when no store data is cached.
    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        self.store_data
            .as_ref()
            .map_or(&[], |data| data.variants.as_slice())
    }
}

/// The store-side part of a product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// A declared product option (e.g. "Size" with values S/M/L).
///
/// `position` is 1-based and names the variant slot (`option1`..`option3`)
/// that holds this option's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    pub position: u8,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A purchasable SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    #[serde(default)]
    pub product_id: Option<ExternalProductId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub option1: Option<String>,
    #[serde(default)]
    pub option2: Option<String>,
    #[serde(default)]
    pub option3: Option<String>,
}

impl Variant {
    /// Value held in the 1-based option slot, if any.
    #[must_use]
    pub fn option(&self, position: u8) -> Option<&str> {
        match position {
            1 => self.option1.as_deref(),
            2 => self.option2.as_deref(),
            3 => self.option3.as_deref(),
            _ => None,
        }
    }
}

/// A content-store clothing category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub store_id: String,
    pub name: String,
    #[serde(default)]
    pub type_of_clothing: ClothingType,
}
