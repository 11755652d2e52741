//! Deciding which fitting items may be worn together on the model.
//!
//! The model view renders the selected items as stacked layers. A model can
//! wear one garment per clothing class, and a one-piece cannot be layered
//! with anything else.

use serde::{Deserialize, Serialize};

use crate::fitting::{FittingItem, ShopperModel};
use crate::types::{ClothingType, ProductId};

/// Result of selecting a candidate for fitting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Products layered on the model, in render order.
    pub selected: Vec<ProductId>,
    /// Product shown in the detail panel, if any.
    pub shown: Option<ProductId>,
}

/// Which rule decided a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    MissingTryOnItem,
    SizeTooSmall,
    Deselected,
    ReplacedSameCategory,
    ReplacedSameClothingType,
    ReplacedOnePiece,
    OnePieceOnly,
    Added,
}

impl Decision {
    /// Whether the selection set was left untouched and a warning should be shown.
    #[must_use]
    pub const fn is_warning(self) -> bool {
        matches!(self, Self::MissingTryOnItem | Self::SizeTooSmall)
    }
}

/// Select `candidate` given the current `selected` ids.
///
/// `items` is the hydrated fitting list used to look up categories and
/// clothing classes. Rules are applied in order and the first match wins:
///
/// 1. no try-on asset for the active model: selection unchanged, candidate shown
/// 2. asset size smaller than the model: selection unchanged, candidate shown
/// 3. already selected: deselected, nothing shown
/// 4. a selected item has the same category: replaced by the candidate
/// 5. a selected item has the same clothing class: replaced by the candidate
/// 6. a one-piece is selected: selection becomes just the candidate
/// 7. the candidate is a one-piece: selection becomes just the candidate
/// 8. otherwise the candidate is appended
///
/// A candidate that is not in `items` is treated as having no try-on asset.
#[must_use]
pub fn select_for_fitting(
    candidate: &ProductId,
    selected: &[ProductId],
    items: &[FittingItem],
    model: Option<&ShopperModel>,
) -> (Selection, Decision) {
    let find = |id: &ProductId| items.iter().find(|item| &item.product_id == id);
    let shown = |ids: Vec<ProductId>| Selection {
        selected: ids,
        shown: Some(candidate.clone()),
    };

    let Some(item) = find(candidate).filter(|item| !item.is_missing_try_on_item()) else {
        return (shown(selected.to_vec()), Decision::MissingTryOnItem);
    };

    if item.is_size_smaller_than(model) {
        return (shown(selected.to_vec()), Decision::SizeTooSmall);
    }

    if let Some(index) = selected.iter().position(|id| id == candidate) {
        let mut ids = selected.to_vec();
        ids.remove(index);
        return (
            Selection {
                selected: ids,
                shown: None,
            },
            Decision::Deselected,
        );
    }

    let same_category = selected.iter().position(|id| {
        find(id).map(|other| other.category_id.as_ref()) == Some(item.category_id.as_ref())
    });
    if let Some(index) = same_category {
        return (
            shown(replace_at(selected, index, candidate)),
            Decision::ReplacedSameCategory,
        );
    }

    let clothing_type = item.clothing_type();
    let same_type = selected
        .iter()
        .position(|id| find(id).map(FittingItem::clothing_type) == Some(clothing_type));
    if let Some(index) = same_type {
        return (
            shown(replace_at(selected, index, candidate)),
            Decision::ReplacedSameClothingType,
        );
    }

    let one_piece_selected = selected
        .iter()
        .any(|id| find(id).map(FittingItem::clothing_type) == Some(ClothingType::OnePiece));
    if one_piece_selected {
        return (shown(vec![candidate.clone()]), Decision::ReplacedOnePiece);
    }

    if clothing_type == ClothingType::OnePiece {
        return (shown(vec![candidate.clone()]), Decision::OnePieceOnly);
    }

    let mut ids = selected.to_vec();
    ids.push(candidate.clone());
    (shown(ids), Decision::Added)
}

fn replace_at(ids: &[ProductId], index: usize, with: &ProductId) -> Vec<ProductId> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| if i == index { with.clone() } else { id.clone() })
        .collect()
}

/// Drop selected ids that are no longer in the fitting list.
#[must_use]
pub fn retain_known(selected: &[ProductId], items: &[FittingItem]) -> Vec<ProductId> {
    selected
        .iter()
        .filter(|id| items.iter().any(|item| &item.product_id == *id))
        .cloned()
        .collect()
}

/// Prompt suggesting what to add next to the model.
///
/// `None` once both the upper and lower body are covered. Only items with a
/// resolved try-on asset count, since only those are rendered.
#[must_use]
pub fn selection_hint(selected: &[&FittingItem]) -> Option<&'static str> {
    let mut wearing_top = false;
    let mut wearing_bottom = false;

    for item in selected.iter().filter(|item| !item.is_missing_try_on_item()) {
        let clothing_type = item.clothing_type();
        wearing_top |= clothing_type.covers_top();
        wearing_bottom |= clothing_type.covers_bottom();
    }

    match (wearing_top, wearing_bottom) {
        (true, true) => None,
        (true, false) => Some("Add a Bottom"),
        (false, true) => Some("Add a Top"),
        (false, false) => Some("Add a Top & Bottom"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::test_support::{item, model};

    fn ids(values: &[&str]) -> Vec<ProductId> {
        values.iter().map(|v| ProductId::new(*v)).collect()
    }

    fn wardrobe() -> Vec<FittingItem> {
        vec![
            item("top-1", "c-shirts", ClothingType::Top, 2),
            item("top-2", "c-blouses", ClothingType::Top, 2),
            item("shirt-2", "c-shirts", ClothingType::Top, 2),
            item("bottom-1", "c-jeans", ClothingType::Bottom, 2),
            item("dress-1", "c-dresses", ClothingType::OnePiece, 2),
            item("dress-2", "c-gowns", ClothingType::OnePiece, 2),
            item("jacket-1", "c-jackets", ClothingType::Jacket, 2),
            item("tiny-1", "c-skirts", ClothingType::Bottom, 1),
        ]
    }

    fn select(candidate: &str, selected: &[&str], items: &[FittingItem]) -> (Selection, Decision) {
        select_for_fitting(&ProductId::new(candidate), &ids(selected), items, Some(&model(2)))
    }

    #[test]
    fn test_top_then_bottom_then_second_top() {
        let items = wardrobe();

        let (selection, decision) = select("top-1", &[], &items);
        assert_eq!(decision, Decision::Added);
        let (selection, _) = select("bottom-1", &as_strs(&selection.selected), &items);
        assert_eq!(selection.selected, ids(&["top-1", "bottom-1"]));

        let (selection, decision) = select("top-2", &as_strs(&selection.selected), &items);
        assert_eq!(decision, Decision::ReplacedSameClothingType);
        assert_eq!(selection.selected, ids(&["top-2", "bottom-1"]));
        assert_eq!(selection.shown, Some(ProductId::new("top-2")));
    }

    #[test]
    fn test_same_category_replaces_in_place() {
        let items = wardrobe();
        let (selection, decision) = select("shirt-2", &["bottom-1", "top-1"], &items);

        assert_eq!(decision, Decision::ReplacedSameCategory);
        assert_eq!(selection.selected, ids(&["bottom-1", "shirt-2"]));
    }

    #[test]
    fn test_one_piece_collapses_top_and_bottom() {
        let items = wardrobe();
        let (selection, decision) = select("dress-1", &["top-1", "bottom-1"], &items);

        assert_eq!(decision, Decision::OnePieceOnly);
        assert_eq!(selection.selected, ids(&["dress-1"]));
    }

    #[test]
    fn test_selected_one_piece_is_replaced_by_separates() {
        let items = wardrobe();
        let (selection, decision) = select("jacket-1", &["dress-1"], &items);

        assert_eq!(decision, Decision::ReplacedOnePiece);
        assert_eq!(selection.selected, ids(&["jacket-1"]));
    }

    #[test]
    fn test_one_piece_replaces_one_piece() {
        let items = wardrobe();
        let (selection, decision) = select("dress-2", &["dress-1"], &items);

        assert_eq!(decision, Decision::ReplacedSameClothingType);
        assert_eq!(selection.selected, ids(&["dress-2"]));
    }

    #[test]
    fn test_missing_try_on_item_keeps_selection() {
        let mut items = wardrobe();
        let mut bare = item("bare-1", "c-jeans", ClothingType::Bottom, 2);
        bare.selected_try_on_item = None;
        items.push(bare);

        let (selection, decision) = select("bare-1", &["top-1"], &items);
        assert_eq!(decision, Decision::MissingTryOnItem);
        assert!(decision.is_warning());
        assert_eq!(selection.selected, ids(&["top-1"]));
        assert_eq!(selection.shown, Some(ProductId::new("bare-1")));
    }

    #[test]
    fn test_unknown_candidate_is_missing_try_on_item() {
        let items = wardrobe();
        let (selection, decision) = select("ghost", &["top-1"], &items);

        assert_eq!(decision, Decision::MissingTryOnItem);
        assert_eq!(selection.selected, ids(&["top-1"]));
    }

    #[test]
    fn test_too_small_keeps_selection() {
        let items = wardrobe();
        let (selection, decision) = select("tiny-1", &["top-1"], &items);

        assert_eq!(decision, Decision::SizeTooSmall);
        assert_eq!(selection.selected, ids(&["top-1"]));
        assert_eq!(selection.shown, Some(ProductId::new("tiny-1")));
    }

    #[test]
    fn test_reselecting_deselects_and_hides() {
        let items = wardrobe();
        let (selection, decision) = select("top-1", &["top-1", "bottom-1"], &items);

        assert_eq!(decision, Decision::Deselected);
        assert_eq!(selection.selected, ids(&["bottom-1"]));
        assert_eq!(selection.shown, None);
    }

    #[test]
    fn test_never_two_of_a_class_or_one_piece_with_others() {
        let items = wardrobe();
        let order = [
            "top-1", "bottom-1", "jacket-1", "top-2", "dress-1", "shirt-2", "dress-2", "bottom-1",
            "top-1", "jacket-1",
        ];

        let mut selected: Vec<ProductId> = Vec::new();
        for candidate in order {
            let (selection, _) =
                select_for_fitting(&ProductId::new(candidate), &selected, &items, Some(&model(2)));
            selected = selection.selected;

            let classes: Vec<ClothingType> = selected
                .iter()
                .filter_map(|id| items.iter().find(|i| &i.product_id == id))
                .map(FittingItem::clothing_type)
                .collect();
            for (i, class) in classes.iter().enumerate() {
                assert!(!classes.iter().skip(i + 1).any(|c| c == class));
            }
            if classes.contains(&ClothingType::OnePiece) {
                assert_eq!(classes.len(), 1);
            }
        }
    }

    #[test]
    fn test_retain_known() {
        let items = wardrobe();
        let kept = retain_known(&ids(&["top-1", "gone", "bottom-1"]), &items);
        assert_eq!(kept, ids(&["top-1", "bottom-1"]));
    }

    #[test]
    fn test_selection_hint() {
        let items = wardrobe();
        let by_id = |id: &str| {
            items
                .iter()
                .find(|i| i.product_id.as_str() == id)
                .expect("item exists")
        };

        assert_eq!(selection_hint(&[]), Some("Add a Top & Bottom"));
        assert_eq!(selection_hint(&[by_id("top-1")]), Some("Add a Bottom"));
        assert_eq!(selection_hint(&[by_id("bottom-1")]), Some("Add a Top"));
        assert_eq!(selection_hint(&[by_id("top-1"), by_id("bottom-1")]), None);
        assert_eq!(selection_hint(&[by_id("dress-1")]), None);
        assert_eq!(selection_hint(&[by_id("jacket-1")]), Some("Add a Top & Bottom"));
    }

    fn as_strs(ids: &[ProductId]) -> Vec<&str> {
        ids.iter().map(ProductId::as_str).collect()
    }
}
