//! Cart items the shopper intends to purchase.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::protocol::LineItem;
use crate::types::{Price, ProductId, VariantId};
use crate::variant::{SelectedOptions, resolve_variant};

/// Variant id recorded when a product has no variants to resolve.
const UNRESOLVED_VARIANT: VariantId = VariantId::new(0);

/// A garment and variant in the shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<SelectedOptions>,
    pub product: Product,
}

impl CartItem {
    /// Build a cart line of quantity one for the variant matching `selected_options`.
    #[must_use]
    pub fn build(product: &Product, selected_options: Option<SelectedOptions>) -> Self {
        let variant = resolve_variant(product, selected_options.as_ref());

        Self {
            variant_id: variant.map_or(UNRESOLVED_VARIANT, |v| v.id),
            product_id: product.id.clone(),
            quantity: 1,
            title: product.title.clone(),
            price: variant.and_then(|v| v.price).or(product.price),
            image_url: product.image_url.clone(),
            selected_options,
            product: product.clone(),
        }
    }

    /// Whether this line is for the given product and variant.
    #[must_use]
    pub fn is(&self, product_id: &ProductId, variant_id: VariantId) -> bool {
        &self.product_id == product_id && self.variant_id == variant_id
    }

    /// Unit price times quantity; zero when the price is unknown.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.unwrap_or(Price::ZERO) * self.quantity
    }

    /// The line as sent to the host store's cart.
    #[must_use]
    pub const fn line_item(&self) -> LineItem {
        LineItem {
            id: self.variant_id,
            quantity: self.quantity,
        }
    }
}

/// Sum of all line totals.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Price {
    items.iter().map(CartItem::line_total).sum()
}
