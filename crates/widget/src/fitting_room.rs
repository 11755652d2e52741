//! Fitting-room session: which fitting items are layered on the model.

use modamatch_core::fitting::hydrate;
use modamatch_core::resolver::{retain_known, selection_hint};
use modamatch_core::{
    Decision, FittingItem, Product, ProductId, ProductTryOnItems, Selection, ShopperModel,
    select_for_fitting,
};

use crate::storage::SettingsStorage;
use crate::store::SettingsStore;

/// Warnings for the item in the detail panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayFlags {
    pub is_size_smaller: bool,
    pub is_missing_try_on_item: bool,
}

/// Selection state for one fitting-room visit.
#[derive(Debug, Clone, Default)]
pub struct FittingRoom {
    selection: Selection,
    last_decision: Option<Decision>,
}

impl FittingRoom {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub const fn last_decision(&self) -> Option<Decision> {
        self.last_decision
    }

    /// Select `candidate` and return the rule that decided it.
    pub fn select(
        &mut self,
        candidate: &ProductId,
        items: &[FittingItem],
        model: Option<&ShopperModel>,
    ) -> Decision {
        let (selection, decision) =
            select_for_fitting(candidate, &self.selection.selected, items, model);
        tracing::debug!(product_id = %candidate, ?decision, "Fitting selection");

        self.selection = selection;
        self.last_decision = Some(decision);
        decision
    }

    /// Item shown in the detail panel.
    #[must_use]
    pub fn shown<'a>(&self, items: &'a [FittingItem]) -> Option<&'a FittingItem> {
        let shown = self.selection.shown.as_ref()?;
        items.iter().find(|item| &item.product_id == shown)
    }

    /// Warnings for the shown item.
    #[must_use]
    pub fn flags(&self, items: &[FittingItem], model: Option<&ShopperModel>) -> DisplayFlags {
        self.shown(items).map_or_else(DisplayFlags::default, |item| DisplayFlags {
            is_size_smaller: item.is_size_smaller_than(model),
            is_missing_try_on_item: item.is_missing_try_on_item(),
        })
    }

    /// Selected items in render order.
    #[must_use]
    pub fn layers<'a>(&self, items: &'a [FittingItem]) -> Vec<&'a FittingItem> {
        self.selection
            .selected
            .iter()
            .filter_map(|id| items.iter().find(|item| &item.product_id == id))
            .collect()
    }

    /// Prompt for what to add next, if anything.
    #[must_use]
    pub fn hint(&self, items: &[FittingItem]) -> Option<&'static str> {
        selection_hint(&self.layers(items))
    }

    /// Forget ids that left the fitting list.
    pub fn prune(&mut self, items: &[FittingItem]) {
        self.selection.selected = retain_known(&self.selection.selected, items);
        if let Some(shown) = &self.selection.shown
            && !items.iter().any(|item| &item.product_id == shown)
        {
            self.selection.shown = None;
        }
    }

    /// Start over, e.g. after the shopper picks another model.
    pub fn reset(&mut self) {
        self.selection = Selection::default();
        self.last_decision = None;
    }
}

/// Hydrate every stored fitting item against fresh catalog data for the
/// active model and persist the result.
pub fn hydrate_store<S: SettingsStorage>(
    store: &mut SettingsStore<S>,
    products: &[Product],
    try_on_items: &[ProductTryOnItems],
) {
    let hydrated: Vec<FittingItem> = store
        .fitting_items()
        .iter()
        .map(|item| {
            let fresh = products.iter().find(|p| p.id == item.product_id);
            let try_on = try_on_items.iter().find(|t| t.product_id == item.product_id);
            hydrate(item, fresh, try_on)
        })
        .collect();

    store.replace_fitting_items(hydrated);
}
