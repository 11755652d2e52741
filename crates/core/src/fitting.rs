//! Fitting-room items and try-on assets.
//!
//! A fitting item is a garment the shopper is trying on virtually. When the
//! fitting room loads for a model it is hydrated: size choices are narrowed
//! to the sizes that have a try-on asset for that model, a default selection
//! is filled in, and the matching try-on asset is attached.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::{CategoryId, ClothingType, ContentfulId, ProductId, TryOnItemId};
use crate::variant::{
    ProductOptions, SelectedOptions, build_selected_options, find_product_options,
};

/// A named garment size with its numeric rank (larger fits bigger bodies).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeRef {
    pub name: String,
    pub value: i32,
}

/// A model-and-size-specific garment layer image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnItem {
    pub id: TryOnItemId,
    #[serde(default)]
    pub size: Option<SizeRef>,
    pub layer_url: String,
    #[serde(default)]
    pub layer_back_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// A shopper-selectable model with body measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopperModel {
    pub index: u32,
    pub name: String,
    #[serde(default)]
    pub size: Option<SizeRef>,
    #[serde(default)]
    pub height_cm: f64,
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default)]
    pub chest_cm: f64,
    #[serde(default)]
    pub waist_cm: f64,
    #[serde(default)]
    pub hip_cm: f64,
}

/// A garment in the shopper's fitting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FittingItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contentful_id: Option<ContentfulId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_options: Option<ProductOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<SelectedOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_try_on_item: Option<TryOnItem>,
    pub product: Product,
}

impl FittingItem {
    /// Build a fresh fitting item for `product`.
    #[must_use]
    pub fn build(product: &Product, selected_options: Option<SelectedOptions>) -> Self {
        Self {
            product_id: product.id.clone(),
            contentful_id: product.contentful_id.clone(),
            category_id: product.category_id.clone(),
            product_options: Some(find_product_options(product)),
            selected_options,
            selected_try_on_item: None,
            product: product.clone(),
        }
    }

    /// Clothing class of the underlying product.
    #[must_use]
    pub const fn clothing_type(&self) -> ClothingType {
        self.product.clothing_type
    }

    /// Whether the resolved try-on asset is a smaller size than the model wears.
    ///
    /// `false` when either size is unknown.
    #[must_use]
    pub fn is_size_smaller_than(&self, model: Option<&ShopperModel>) -> bool {
        let item_size = self
            .selected_try_on_item
            .as_ref()
            .and_then(|item| item.size.as_ref());
        let model_size = model.and_then(|model| model.size.as_ref());

        match (item_size, model_size) {
            (Some(item), Some(model)) => item.value < model.value,
            _ => false,
        }
    }

    /// Whether no try-on asset has been resolved for the current model and size.
    #[must_use]
    pub const fn is_missing_try_on_item(&self) -> bool {
        self.selected_try_on_item.is_none()
    }
}

/// Try-on assets available for one product on the active model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTryOnItems {
    pub product_id: ProductId,
    #[serde(default)]
    pub all_try_on_items: Vec<TryOnItem>,
    #[serde(default)]
    pub all_try_on_item_sizes: Vec<String>,
}

/// Hydrate `item` against freshly fetched data for the active model.
///
/// `fresh_product` replaces the stored snapshot when the catalog returned it.
/// Size choices are narrowed to sizes with a try-on asset, the stored
/// selection is kept (or defaulted to the first values), and the try-on asset
/// whose size name equals the selected size is attached.
#[must_use]
pub fn hydrate(
    item: &FittingItem,
    fresh_product: Option<&Product>,
    try_on: Option<&ProductTryOnItems>,
) -> FittingItem {
    let product = fresh_product.unwrap_or(&item.product).clone();

    let mut options = find_product_options(&product);
    let sizes = try_on.map_or(&[][..], |t| t.all_try_on_item_sizes.as_slice());
    options.retain_sizes(sizes);

    let selected = item
        .selected_options
        .clone()
        .unwrap_or_else(|| build_selected_options(&options));

    let selected_try_on_item = try_on.and_then(|t| {
        t.all_try_on_items
            .iter()
            .find(|candidate| {
                candidate.size.as_ref().map(|size| size.name.as_str()) == selected.size.as_deref()
            })
            .cloned()
    });

    FittingItem {
        product_options: Some(options),
        selected_options: Some(selected),
        selected_try_on_item,
        product,
        ..item.clone()
    }
}
