//! A shopper's fitting session: persisted settings, hydration against fresh
//! catalog data, and what ends up layered on the model.

#![allow(clippy::unwrap_used)]

use modamatch_core::{
    ClothingType, Decision, FittingItem, Price, ProductId, SelectedOptions, ShopperModel, SizeRef,
    StoreId, VariantId,
};
use modamatch_integration_tests::{STORE_ID, product, try_on_items};
use modamatch_widget::{FileStorage, FittingRoom, SettingsStore, hydrate_store};

fn model(size_rank: i32) -> ShopperModel {
    ShopperModel {
        index: 2,
        name: "Maya".to_owned(),
        size: Some(SizeRef {
            name: "M".to_owned(),
            value: size_rank,
        }),
        height_cm: 170.0,
        weight_kg: 60.0,
        chest_cm: 88.0,
        waist_cm: 70.0,
        hip_cm: 95.0,
    }
}

fn size(value: &str) -> Option<SelectedOptions> {
    Some(SelectedOptions {
        size: Some(value.to_owned()),
        color: None,
    })
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_settings_survive_reload() {
    let dir = tempfile::tempdir().unwrap();
    let shirt = product("shirt", "c-shirts", ClothingType::Top, &["S", "M", "L"]);
    let jeans = product("jeans", "c-jeans", ClothingType::Bottom, &["30", "32"]);

    {
        let mut store = SettingsStore::load(
            StoreId::new(STORE_ID),
            FileStorage::open(dir.path()).unwrap(),
        );
        store.select_model(Some(2));
        store.add_or_toggle_fitting_item(&shirt, size("M"));
        store.add_or_toggle_fitting_item(&jeans, None);
        store.add_or_increment_cart_item(&shirt, size("M"));
        store.add_or_increment_cart_item(&shirt, size("M"));
    }

    let store = SettingsStore::load(
        StoreId::new(STORE_ID),
        FileStorage::open(dir.path()).unwrap(),
    );

    assert_eq!(store.selected_model(), Some(2));
    let fitting: Vec<&str> = store
        .fitting_items()
        .iter()
        .map(|item| item.product_id.as_str())
        .collect();
    assert_eq!(fitting, vec!["shirt", "jeans"]);

    match store.cart_items() {
        [line] => {
            assert_eq!(line.variant_id, VariantId::new(101));
            assert_eq!(line.quantity, 2);
            assert_eq!(line.line_total(), Price::from_cents(9800));
        }
        other => panic!("unexpected cart: {other:?}"),
    }
}

#[test]
fn test_settings_are_kept_per_store() {
    let dir = tempfile::tempdir().unwrap();
    let shirt = product("shirt", "c-shirts", ClothingType::Top, &["S", "M"]);

    let mut acme = SettingsStore::load(
        StoreId::new(STORE_ID),
        FileStorage::open(dir.path()).unwrap(),
    );
    acme.add_or_toggle_fitting_item(&shirt, None);

    let other = SettingsStore::load(
        StoreId::new("other.myshopify.com"),
        FileStorage::open(dir.path()).unwrap(),
    );
    assert!(other.fitting_items().is_empty());
    assert_eq!(acme.fitting_items().len(), 1);
}

#[test]
fn test_toggle_removes_and_clear_cart_empties() {
    let dir = tempfile::tempdir().unwrap();
    let shirt = product("shirt", "c-shirts", ClothingType::Top, &["S", "M"]);

    let mut store = SettingsStore::load(
        StoreId::new(STORE_ID),
        FileStorage::open(dir.path()).unwrap(),
    );
    store.add_or_toggle_fitting_item(&shirt, None);
    store.add_or_toggle_fitting_item(&shirt, None);
    store.add_or_increment_cart_item(&shirt, None);
    store.clear_cart();

    let reloaded = SettingsStore::load(
        StoreId::new(STORE_ID),
        FileStorage::open(dir.path()).unwrap(),
    );
    assert!(reloaded.fitting_items().is_empty());
    assert!(reloaded.cart_items().is_empty());
}

// =============================================================================
// Hydration and Selection
// =============================================================================

#[test]
fn test_outfit_is_assembled_after_hydration() {
    let dir = tempfile::tempdir().unwrap();
    let shirt = product("shirt", "c-shirts", ClothingType::Top, &["S", "M", "L"]);
    let blouse = product("blouse", "c-blouses", ClothingType::Top, &["S", "M"]);
    let jeans = product("jeans", "c-jeans", ClothingType::Bottom, &["S", "M"]);
    let dress = product("dress", "c-dresses", ClothingType::OnePiece, &["M"]);

    let mut store = SettingsStore::load(
        StoreId::new(STORE_ID),
        FileStorage::open(dir.path()).unwrap(),
    );
    for garment in [&shirt, &blouse, &jeans, &dress] {
        store.add_or_toggle_fitting_item(garment, None);
    }

    // No asset exists in L, so the shirt's size choices shrink to S and M.
    hydrate_store(
        &mut store,
        &[shirt.clone(), blouse.clone(), jeans.clone(), dress.clone()],
        &[
            try_on_items("shirt", &[("S", 1), ("M", 2)]),
            try_on_items("blouse", &[("S", 1)]),
            try_on_items("jeans", &[("S", 1), ("M", 2)]),
            try_on_items("dress", &[("M", 2)]),
        ],
    );

    let items: Vec<FittingItem> = store.fitting_items().to_vec();
    let shirt_item = store.find_fitting_item(&shirt.id).unwrap();
    let shirt_sizes = shirt_item
        .product_options
        .as_ref()
        .and_then(|options| options.size.as_ref())
        .map(|option| option.values.clone())
        .unwrap();
    assert_eq!(shirt_sizes, vec!["S", "M"]);
    assert_eq!(shirt_item.selected_options, size("S"));

    let wearer = model(1);
    let mut room = FittingRoom::new();
    assert_eq!(room.hint(&items), Some("Add a Top & Bottom"));

    assert_eq!(room.select(&shirt.id, &items, Some(&wearer)), Decision::Added);
    assert_eq!(room.hint(&items), Some("Add a Bottom"));

    assert_eq!(room.select(&jeans.id, &items, Some(&wearer)), Decision::Added);
    assert_eq!(room.hint(&items), None);

    assert_eq!(
        room.select(&blouse.id, &items, Some(&wearer)),
        Decision::ReplacedSameClothingType
    );
    let layered: Vec<&ProductId> = room.layers(&items).iter().map(|item| &item.product_id).collect();
    assert_eq!(layered, vec![&blouse.id, &jeans.id]);

    assert_eq!(room.select(&dress.id, &items, Some(&wearer)), Decision::OnePieceOnly);
    assert_eq!(room.selection().selected, vec![dress.id.clone()]);
    assert_eq!(room.hint(&items), None);

    assert_eq!(room.select(&dress.id, &items, Some(&wearer)), Decision::Deselected);
    assert!(room.shown(&items).is_none());
}

#[test]
fn test_smaller_asset_is_shown_with_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let shirt = product("shirt", "c-shirts", ClothingType::Top, &["S", "M"]);

    let mut store = SettingsStore::load(
        StoreId::new(STORE_ID),
        FileStorage::open(dir.path()).unwrap(),
    );
    store.add_or_toggle_fitting_item(&shirt, size("S"));
    hydrate_store(
        &mut store,
        std::slice::from_ref(&shirt),
        &[try_on_items("shirt", &[("S", 1), ("M", 2)])],
    );

    let items = store.fitting_items().to_vec();
    let wearer = model(2);
    let mut room = FittingRoom::new();

    let decision = room.select(&shirt.id, &items, Some(&wearer));

    assert_eq!(decision, Decision::SizeTooSmall);
    assert!(decision.is_warning());
    assert!(room.selection().selected.is_empty());
    assert!(room.flags(&items, Some(&wearer)).is_size_smaller);
}

#[test]
fn test_item_without_asset_and_pruning() {
    let dir = tempfile::tempdir().unwrap();
    let shirt = product("shirt", "c-shirts", ClothingType::Top, &["S"]);
    let skirt = product("skirt", "c-skirts", ClothingType::Bottom, &["S"]);

    let mut store = SettingsStore::load(
        StoreId::new(STORE_ID),
        FileStorage::open(dir.path()).unwrap(),
    );
    store.add_or_toggle_fitting_item(&shirt, None);
    store.add_or_toggle_fitting_item(&skirt, None);
    hydrate_store(
        &mut store,
        &[shirt.clone(), skirt.clone()],
        &[try_on_items("shirt", &[("S", 1)])],
    );

    let items = store.fitting_items().to_vec();
    let mut room = FittingRoom::new();

    assert_eq!(room.select(&shirt.id, &items, None), Decision::Added);
    assert_eq!(room.select(&skirt.id, &items, None), Decision::MissingTryOnItem);
    assert!(room.flags(&items, None).is_missing_try_on_item);
    assert_eq!(room.selection().selected, vec![shirt.id.clone()]);

    store.add_or_toggle_fitting_item(&shirt, None);
    room.prune(store.fitting_items());
    assert!(room.selection().selected.is_empty());
    assert_eq!(
        room.shown(store.fitting_items()).map(|item| &item.product_id),
        Some(&skirt.id)
    );
}
