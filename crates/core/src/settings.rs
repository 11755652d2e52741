//! Shopper settings: chosen model, fitting list and cart list.
//!
//! Every transition takes the current settings by value and returns the next
//! snapshot. Persistence is a separate write-through step owned by the
//! caller, so these functions never touch storage.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::fitting::FittingItem;
use crate::product::Product;
use crate::types::{ProductId, VariantId};
use crate::variant::SelectedOptions;

/// Storage key of the fitting list for a store.
#[must_use]
pub fn fitting_items_key(store_id: &str) -> String {
    format!("{store_id}-fittingItems")
}

/// Storage key of the cart list for a store.
#[must_use]
pub fn cart_items_key(store_id: &str) -> String {
    format!("{store_id}-cartItems")
}

/// Storage key of the chosen model index (shared across stores).
pub const MODEL_KEY: &str = "model";

/// Partial update of a fitting item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FittingItemPatch {
    pub selected_options: Option<SelectedOptions>,
    pub product_options: Option<crate::variant::ProductOptions>,
    pub selected_try_on_item: Option<crate::fitting::TryOnItem>,
    pub product: Option<Product>,
}

/// Partial update of a cart item.
///
/// `product_id`/`variant_id` locate the line when set; otherwise the
/// variant passed to [`CustomerSettings::update_cart_item`] is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartItemPatch {
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub quantity: Option<u32>,
    pub selected_options: Option<SelectedOptions>,
}

/// The shopper's settings for one store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSettings {
    #[serde(default)]
    pub selected_model: Option<u32>,
    #[serde(default)]
    pub fitting_items: Vec<FittingItem>,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
}

impl CustomerSettings {
    // -------------------------------------------------------------------------
    // Model
    // -------------------------------------------------------------------------

    /// Choose a model. Switching to a different model drops size and color
    /// choices from every fitting item, since they may no longer fit.
    #[must_use]
    pub fn select_model(self, index: Option<u32>) -> Self {
        let changed = self.selected_model != index;
        let next = Self {
            selected_model: index,
            ..self
        };
        if changed {
            next.clear_fitting_item_options()
        } else {
            next
        }
    }

    // -------------------------------------------------------------------------
    // Fitting list
    // -------------------------------------------------------------------------

    /// Find a fitting item by product id.
    #[must_use]
    pub fn find_fitting_item(&self, product_id: &ProductId) -> Option<&FittingItem> {
        self.fitting_items
            .iter()
            .find(|item| &item.product_id == product_id)
    }

    /// Whether the product is in the fitting list.
    #[must_use]
    pub fn is_on_fitting_items(&self, product_id: &ProductId) -> bool {
        self.find_fitting_item(product_id).is_some()
    }

    /// Add a product to the fitting list; if already present, only its
    /// selected options are updated.
    #[must_use]
    pub fn add_fitting_item(
        self,
        product: &Product,
        selected_options: Option<SelectedOptions>,
    ) -> Self {
        if self.is_on_fitting_items(&product.id) {
            return self.update_fitting_item(
                &product.id,
                FittingItemPatch {
                    selected_options,
                    ..FittingItemPatch::default()
                },
            );
        }

        let mut fitting_items = self.fitting_items;
        fitting_items.push(FittingItem::build(product, selected_options));
        Self {
            fitting_items,
            ..self
        }
    }

    /// Remove the product if it is in the fitting list, otherwise add it.
    #[must_use]
    pub fn add_or_toggle_fitting_item(
        self,
        product: &Product,
        selected_options: Option<SelectedOptions>,
    ) -> Self {
        if self.is_on_fitting_items(&product.id) {
            self.remove_fitting_item(&product.id)
        } else {
            self.add_fitting_item(product, selected_options)
        }
    }

    /// Merge `patch` into the fitting item for `product_id`. No-op when absent.
    #[must_use]
    pub fn update_fitting_item(self, product_id: &ProductId, patch: FittingItemPatch) -> Self {
        let mut fitting_items = self.fitting_items;
        if let Some(item) = fitting_items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
        {
            if let Some(selected_options) = patch.selected_options {
                item.selected_options = Some(selected_options);
            }
            if let Some(product_options) = patch.product_options {
                item.product_options = Some(product_options);
            }
            if let Some(try_on) = patch.selected_try_on_item {
                item.selected_try_on_item = Some(try_on);
            }
            if let Some(product) = patch.product {
                item.product = product;
            }
        }

        Self {
            fitting_items: unique_by(fitting_items, |item| item.product_id.clone()),
            ..self
        }
    }

    /// Swap in each given item wholesale for the stored item with the same
    /// product id, keeping list order.
    ///
    /// Unlike [`Self::update_fitting_item`], every field is overwritten, so a
    /// try-on asset that no longer resolves is cleared. Items not in the
    /// list are ignored.
    #[must_use]
    pub fn replace_fitting_items(self, mut replacements: Vec<FittingItem>) -> Self {
        let fitting_items: Vec<FittingItem> = self
            .fitting_items
            .into_iter()
            .map(|item| {
                replacements
                    .iter()
                    .position(|r| r.product_id == item.product_id)
                    .map_or(item, |index| replacements.swap_remove(index))
            })
            .collect();

        Self {
            fitting_items: unique_by(fitting_items, |item| item.product_id.clone()),
            ..self
        }
    }

    /// Remove the fitting item for `product_id`.
    #[must_use]
    pub fn remove_fitting_item(self, product_id: &ProductId) -> Self {
        let mut fitting_items = self.fitting_items;
        fitting_items.retain(|item| &item.product_id != product_id);
        Self {
            fitting_items,
            ..self
        }
    }

    /// Strip available and selected options from every fitting item, keeping
    /// the items themselves.
    #[must_use]
    pub fn clear_fitting_item_options(self) -> Self {
        let fitting_items = self
            .fitting_items
            .into_iter()
            .map(|item| FittingItem {
                product_options: None,
                selected_options: None,
                ..item
            })
            .collect();
        Self {
            fitting_items,
            ..self
        }
    }

    // -------------------------------------------------------------------------
    // Cart list
    // -------------------------------------------------------------------------

    /// Find the cart line for a product and variant.
    #[must_use]
    pub fn find_cart_item(&self, product_id: &ProductId, variant_id: VariantId) -> Option<&CartItem> {
        self.cart_items
            .iter()
            .find(|item| item.is(product_id, variant_id))
    }

    /// Whether the variant matching `selected_options` is already in the cart.
    #[must_use]
    pub fn is_on_cart_items(
        &self,
        product: &Product,
        selected_options: Option<SelectedOptions>,
    ) -> bool {
        let line = CartItem::build(product, selected_options);
        self.find_cart_item(&line.product_id, line.variant_id)
            .is_some()
    }

    /// Add one of the resolved variant to the cart, incrementing the
    /// quantity when the line already exists.
    #[must_use]
    pub fn add_or_increment_cart_item(
        self,
        product: &Product,
        selected_options: Option<SelectedOptions>,
    ) -> Self {
        let line = CartItem::build(product, selected_options);

        if let Some(existing) = self.find_cart_item(&line.product_id, line.variant_id) {
            let quantity = existing.quantity.saturating_add(1);
            let variant_id = line.variant_id;
            return self.update_cart_item(
                variant_id,
                CartItemPatch {
                    product_id: Some(line.product_id),
                    quantity: Some(quantity),
                    selected_options: line.selected_options,
                    ..CartItemPatch::default()
                },
            );
        }

        let mut cart_items = self.cart_items;
        cart_items.push(line);
        Self { cart_items, ..self }
    }

    /// Merge `patch` into the matching cart line. No-op when absent.
    ///
    /// A quantity of zero is ignored; use [`Self::remove_cart_item`].
    #[must_use]
    pub fn update_cart_item(self, variant_id: VariantId, patch: CartItemPatch) -> Self {
        let target_variant = patch.variant_id.unwrap_or(variant_id);
        let mut cart_items = self.cart_items;

        let found = cart_items.iter_mut().find(|item| {
            item.variant_id == target_variant
                && patch
                    .product_id
                    .as_ref()
                    .is_none_or(|product_id| &item.product_id == product_id)
        });
        if let Some(item) = found {
            if let Some(quantity) = patch.quantity.filter(|q| *q > 0) {
                item.quantity = quantity;
            }
            if let Some(selected_options) = patch.selected_options {
                item.selected_options = Some(selected_options);
            }
        }

        Self {
            cart_items: unique_by(cart_items, |item| {
                (item.product_id.clone(), item.variant_id)
            }),
            ..self
        }
    }

    /// Remove the cart line for a product and variant.
    #[must_use]
    pub fn remove_cart_item(self, product_id: &ProductId, variant_id: VariantId) -> Self {
        let mut cart_items = self.cart_items;
        cart_items.retain(|item| !item.is(product_id, variant_id));
        Self { cart_items, ..self }
    }
}

/// Keep the first element for each key, preserving order.
fn unique_by<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}
