//! Resolving a shopper's size/color choice to a purchasable variant.
//!
//! Stores do not agree on which variant slot holds size and which holds
//! color, so the slot is always read from the product's declared options.

use serde::{Deserialize, Serialize};

use crate::product::{Product, ProductOption, Variant};

/// Slot assumed for size when the product declares no size option.
const DEFAULT_SIZE_POSITION: u8 = 1;
/// Slot assumed for color when the product declares no color option.
const DEFAULT_COLOR_POSITION: u8 = 2;

/// Available size and color choices of a product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductOptions {
    #[serde(default)]
    pub size: Option<ProductOption>,
    #[serde(default)]
    pub color: Option<ProductOption>,
}

impl ProductOptions {
    /// Keep only size values for which a try-on asset exists.
    pub fn retain_sizes(&mut self, available: &[String]) {
        if let Some(size) = self.size.as_mut() {
            size.values.retain(|value| available.contains(value));
        }
    }
}

/// The size and color a shopper picked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SelectedOptions {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Find the product's declared size and color options (case-insensitive).
#[must_use]
pub fn find_product_options(product: &Product) -> ProductOptions {
    let find = |name: &str| {
        product
            .options()
            .iter()
            .find(|option| option.name.eq_ignore_ascii_case(name))
            .cloned()
    };

    ProductOptions {
        size: find("size"),
        color: find("color"),
    }
}

/// Default selection: the first listed value of each option.
#[must_use]
pub fn build_selected_options(options: &ProductOptions) -> SelectedOptions {
    let first = |option: &Option<ProductOption>| {
        option
            .as_ref()
            .and_then(|option| option.values.first().cloned())
    };

    SelectedOptions {
        size: first(&options.size),
        color: first(&options.color),
    }
}

/// Whether the product has more than one purchasable variant.
#[must_use]
pub fn has_variants(product: &Product) -> bool {
    product.variants().len() > 1
}

/// Resolve the variant matching `selected`.
///
/// A single-variant product returns that variant no matter what was
/// selected. Otherwise the first variant whose size and color slots equal
/// the selection wins; when nothing matches, the first variant is returned.
/// `None` only when the product has no variants at all.
#[must_use]
pub fn resolve_variant<'a>(
    product: &'a Product,
    selected: Option<&SelectedOptions>,
) -> Option<&'a Variant> {
    let variants = product.variants();
    if !has_variants(product) {
        return variants.first();
    }

    let options = find_product_options(product);
    let defaults;
    let selected = if let Some(selected) = selected {
        selected
    } else {
        defaults = build_selected_options(&options);
        &defaults
    };

    let size_position = options
        .size
        .as_ref()
        .map_or(DEFAULT_SIZE_POSITION, |option| option.position);
    let color_position = options
        .color
        .as_ref()
        .map_or(DEFAULT_COLOR_POSITION, |option| option.position);

    variants
        .iter()
        .find(|variant| {
            variant.option(size_position) == selected.size.as_deref()
                && variant.option(color_position) == selected.color.as_deref()
        })
        .or_else(|| variants.first())
}
