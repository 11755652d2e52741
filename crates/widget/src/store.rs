//! Write-through settings store.
//!
//! [`SettingsStore`] owns the current [`CustomerSettings`] snapshot for one
//! store. Each mutator applies the pure transition from `modamatch_core` and
//! then writes the whole affected list to storage. A failed write is logged
//! and the in-memory snapshot is kept; the next successful write of that list
//! brings storage back in line.

use modamatch_core::settings::{
    CartItemPatch, FittingItemPatch, MODEL_KEY, cart_items_key, fitting_items_key,
};
use modamatch_core::{
    CartItem, CustomerSettings, FittingItem, Product, ProductId, SelectedOptions, StoreId,
    VariantId,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;
use crate::storage::SettingsStorage;

/// Which lists a transition touched.
#[derive(Debug, Clone, Copy)]
enum Touched {
    Model,
    Fitting,
    Cart,
}

/// Settings for one store, persisted after every mutation.
#[derive(Debug)]
pub struct SettingsStore<S> {
    store_id: StoreId,
    storage: S,
    settings: CustomerSettings,
}

impl<S: SettingsStorage> SettingsStore<S> {
    /// Load settings for `store_id`.
    ///
    /// Missing keys start empty. Unreadable or corrupt values are logged and
    /// treated as empty so the widget still opens.
    pub fn load(store_id: StoreId, storage: S) -> Self {
        let fitting_items: Vec<FittingItem> =
            read_list(&storage, &fitting_items_key(store_id.as_str()));
        let cart_items: Vec<CartItem> = read_list(&storage, &cart_items_key(store_id.as_str()));
        let selected_model = read_model(&storage);

        tracing::debug!(
            store_id = %store_id,
            fitting_items = fitting_items.len(),
            cart_items = cart_items.len(),
            ?selected_model,
            "Loaded shopper settings"
        );

        Self {
            store_id,
            storage,
            settings: CustomerSettings {
                selected_model,
                fitting_items,
                cart_items,
            },
        }
    }

    #[must_use]
    pub const fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    /// Current snapshot.
    #[must_use]
    pub const fn settings(&self) -> &CustomerSettings {
        &self.settings
    }

    #[must_use]
    pub const fn selected_model(&self) -> Option<u32> {
        self.settings.selected_model
    }

    #[must_use]
    pub fn fitting_items(&self) -> &[FittingItem] {
        &self.settings.fitting_items
    }

    #[must_use]
    pub fn cart_items(&self) -> &[CartItem] {
        &self.settings.cart_items
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn find_fitting_item(&self, product_id: &ProductId) -> Option<&FittingItem> {
        self.settings.find_fitting_item(product_id)
    }

    #[must_use]
    pub fn is_on_fitting_items(&self, product_id: &ProductId) -> bool {
        self.settings.is_on_fitting_items(product_id)
    }

    #[must_use]
    pub fn find_cart_item(&self, product_id: &ProductId, variant_id: VariantId) -> Option<&CartItem> {
        self.settings.find_cart_item(product_id, variant_id)
    }

    #[must_use]
    pub fn is_on_cart_items(
        &self,
        product: &Product,
        selected_options: Option<SelectedOptions>,
    ) -> bool {
        self.settings.is_on_cart_items(product, selected_options)
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    pub fn select_model(&mut self, index: Option<u32>) {
        let changed = self.settings.selected_model != index;
        self.apply(Touched::Model, |s| s.select_model(index));
        if changed {
            self.persist(Touched::Fitting);
        }
    }

    pub fn add_or_toggle_fitting_item(
        &mut self,
        product: &Product,
        selected_options: Option<SelectedOptions>,
    ) {
        self.apply(Touched::Fitting, |s| {
            s.add_or_toggle_fitting_item(product, selected_options)
        });
    }

    pub fn add_fitting_item(&mut self, product: &Product, selected_options: Option<SelectedOptions>) {
        self.apply(Touched::Fitting, |s| s.add_fitting_item(product, selected_options));
    }

    pub fn update_fitting_item(&mut self, product_id: &ProductId, patch: FittingItemPatch) {
        self.apply(Touched::Fitting, |s| s.update_fitting_item(product_id, patch));
    }

    /// Replace a fitting item wholesale, keeping its position.
    pub fn replace_fitting_item(&mut self, item: FittingItem) {
        self.replace_fitting_items(vec![item]);
    }

    /// Replace several fitting items in one write, e.g. after hydration.
    pub fn replace_fitting_items(&mut self, items: Vec<FittingItem>) {
        self.apply(Touched::Fitting, |s| s.replace_fitting_items(items));
    }

    pub fn remove_fitting_item(&mut self, product_id: &ProductId) {
        self.apply(Touched::Fitting, |s| s.remove_fitting_item(product_id));
    }

    pub fn clear_fitting_item_options(&mut self) {
        self.apply(Touched::Fitting, CustomerSettings::clear_fitting_item_options);
    }

    pub fn add_or_increment_cart_item(
        &mut self,
        product: &Product,
        selected_options: Option<SelectedOptions>,
    ) {
        self.apply(Touched::Cart, |s| {
            s.add_or_increment_cart_item(product, selected_options)
        });
    }

    pub fn update_cart_item(&mut self, variant_id: VariantId, patch: CartItemPatch) {
        self.apply(Touched::Cart, |s| s.update_cart_item(variant_id, patch));
    }

    pub fn remove_cart_item(&mut self, product_id: &ProductId, variant_id: VariantId) {
        self.apply(Touched::Cart, |s| s.remove_cart_item(product_id, variant_id));
    }

    /// Empty the cart, e.g. after handing it to the host checkout.
    pub fn clear_cart(&mut self) {
        self.apply(Touched::Cart, |s| CustomerSettings {
            cart_items: Vec::new(),
            ..s
        });
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    fn apply(&mut self, touched: Touched, transition: impl FnOnce(CustomerSettings) -> CustomerSettings) {
        let current = std::mem::take(&mut self.settings);
        self.settings = transition(current);
        self.persist(touched);
    }

    fn persist(&self, touched: Touched) {
        let store_id = self.store_id.as_str();
        let result = match touched {
            Touched::Model => {
                let value = self
                    .settings
                    .selected_model
                    .map(|index| index.to_string())
                    .unwrap_or_default();
                self.storage.set(MODEL_KEY, &value)
            }
            Touched::Fitting => write_list(
                &self.storage,
                &fitting_items_key(store_id),
                &self.settings.fitting_items,
            ),
            Touched::Cart => write_list(
                &self.storage,
                &cart_items_key(store_id),
                &self.settings.cart_items,
            ),
        };

        if let Err(e) = result {
            tracing::warn!(store_id, ?touched, error = %e, "Failed to persist shopper settings");
        }
    }
}

fn read_list<T: DeserializeOwned>(storage: &impl SettingsStorage, key: &str) -> Vec<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read stored list");
            return Vec::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|source| {
        let e = StorageError::Corrupt {
            key: key.to_owned(),
            source,
        };
        tracing::warn!(error = %e, "Discarding stored list");
        Vec::new()
    })
}

fn read_model(storage: &impl SettingsStorage) -> Option<u32> {
    match storage.get(MODEL_KEY) {
        Ok(value) => value.and_then(|v| v.trim().parse().ok()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read stored model");
            None
        }
    }
}

fn write_list<T: Serialize>(
    storage: &impl SettingsStorage,
    key: &str,
    items: &[T],
) -> Result<(), StorageError> {
    let json = serde_json::to_string(items)?;
    storage.set(key, &json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStorage;
    use modamatch_core::product::{Platform, ProductOption, StoreData, Variant};
    use modamatch_core::{CategoryId, ClothingType, ExternalProductId, Price};

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::new(id),
            shop_name: "acme.myshopify.com".to_owned(),
            platform: Platform::Shopify,
            external_id: ExternalProductId::new(1),
            title: Some(format!("Product {id}")),
            description: None,
            short_description: None,
            price: Some(Price::from_cents(1900)),
            image_url: None,
            main_image_url: None,
            additional_images: Vec::new(),
            contentful_id: None,
            category_id: Some(CategoryId::new("c-tops")),
            clothing_type: ClothingType::Top,
            enabled: true,
            store_data: Some(StoreData {
                options: vec![ProductOption {
                    name: "Size".to_owned(),
                    position: 1,
                    values: vec!["S".to_owned(), "M".to_owned()],
                }],
                variants: vec![
                    Variant {
                        id: VariantId::new(10),
                        product_id: None,
                        title: None,
                        price: None,
                        option1: Some("S".to_owned()),
                        option2: None,
                        option3: None,
                    },
                    Variant {
                        id: VariantId::new(11),
                        product_id: None,
                        title: None,
                        price: None,
                        option1: Some("M".to_owned()),
                        option2: None,
                        option3: None,
                    },
                ],
            }),
        }
    }

    fn size(value: &str) -> Option<SelectedOptions> {
        Some(SelectedOptions {
            size: Some(value.to_owned()),
            color: None,
        })
    }

    /// Storage whose writes always fail.
    struct ReadOnly;

    impl SettingsStorage for ReadOnly {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(std::io::Error::other("read-only").into())
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_mutations_write_through() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SettingsStore::load(StoreId::new("acme"), Arc::clone(&storage));

        store.add_fitting_item(&product("p1"), None);
        store.add_or_increment_cart_item(&product("p1"), size("M"));
        store.select_model(Some(2));

        let fitting: Vec<FittingItem> =
            serde_json::from_str(&storage.get("acme-fittingItems").unwrap().unwrap()).unwrap();
        let cart: Vec<CartItem> =
            serde_json::from_str(&storage.get("acme-cartItems").unwrap().unwrap()).unwrap();

        assert_eq!(fitting.len(), 1);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].variant_id, VariantId::new(11));
        assert_eq!(storage.get("model").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_reload_restores_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let mut store = SettingsStore::load(StoreId::new("acme"), Arc::clone(&storage));
            store.select_model(Some(1));
            store.add_fitting_item(&product("p1"), size("S"));
            store.add_or_increment_cart_item(&product("p1"), size("S"));
            store.add_or_increment_cart_item(&product("p1"), size("S"));
        }

        let store = SettingsStore::load(StoreId::new("acme"), storage);
        assert_eq!(store.selected_model(), Some(1));
        assert_eq!(store.fitting_items().len(), 1);
        assert_eq!(store.cart_items()[0].quantity, 2);
    }

    #[test]
    fn test_stores_do_not_share_lists() {
        let storage = Arc::new(MemoryStorage::new());
        let mut acme = SettingsStore::load(StoreId::new("acme"), Arc::clone(&storage));
        acme.add_fitting_item(&product("p1"), None);

        let globex = SettingsStore::load(StoreId::new("globex"), storage);
        assert!(globex.fitting_items().is_empty());
    }

    #[test]
    fn test_model_switch_clears_persisted_options() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SettingsStore::load(StoreId::new("acme"), Arc::clone(&storage));
        store.select_model(Some(1));
        store.add_fitting_item(&product("p1"), size("S"));

        store.select_model(Some(2));

        let fitting: Vec<FittingItem> =
            serde_json::from_str(&storage.get("acme-fittingItems").unwrap().unwrap()).unwrap();
        assert_eq!(fitting.len(), 1);
        assert!(fitting[0].selected_options.is_none());
    }

    #[test]
    fn test_clearing_model_stores_empty_string() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SettingsStore::load(StoreId::new("acme"), Arc::clone(&storage));
        store.select_model(Some(4));
        store.select_model(None);

        assert_eq!(storage.get("model").unwrap().as_deref(), Some(""));
        assert_eq!(SettingsStore::load(StoreId::new("acme"), storage).selected_model(), None);
    }

    #[test]
    fn test_corrupt_list_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("acme-fittingItems", "{not json").unwrap();

        let store = SettingsStore::load(StoreId::new("acme"), storage);
        assert!(store.fitting_items().is_empty());
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut store = SettingsStore::load(StoreId::new("acme"), ReadOnly);
        store.add_or_toggle_fitting_item(&product("p1"), None);

        assert!(store.is_on_fitting_items(&ProductId::new("p1")));
    }

    /// Memory storage that counts writes per key.
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        writes: std::sync::Mutex<std::collections::HashMap<String, usize>>,
    }

    impl CountingStorage {
        fn writes(&self, key: &str) -> usize {
            self.writes.lock().unwrap().get(key).copied().unwrap_or(0)
        }
    }

    impl SettingsStorage for CountingStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            *self.writes.lock().unwrap().entry(key.to_owned()).or_default() += 1;
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_replace_many_writes_once() {
        let storage = Arc::new(CountingStorage::default());
        let mut store = SettingsStore::load(StoreId::new("acme"), Arc::clone(&storage));
        store.add_fitting_item(&product("p1"), None);
        store.add_fitting_item(&product("p2"), None);
        let before = storage.writes("acme-fittingItems");

        let items: Vec<FittingItem> = store
            .fitting_items()
            .iter()
            .cloned()
            .map(|item| FittingItem {
                selected_options: size("S"),
                ..item
            })
            .collect();
        store.replace_fitting_items(items);

        assert_eq!(storage.writes("acme-fittingItems"), before + 1);
        assert!(
            store
                .fitting_items()
                .iter()
                .all(|item| item.selected_options == size("S"))
        );
    }

    #[test]
    fn test_replace_fitting_item_and_clear_cart() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SettingsStore::load(StoreId::new("acme"), Arc::clone(&storage));
        store.add_fitting_item(&product("p1"), None);
        store.add_or_increment_cart_item(&product("p1"), None);

        let mut item = store.find_fitting_item(&ProductId::new("p1")).unwrap().clone();
        item.selected_options = size("M");
        store.replace_fitting_item(item);
        store.clear_cart();

        assert_eq!(
            store.find_fitting_item(&ProductId::new("p1")).unwrap().selected_options,
            size("M")
        );
        assert!(store.cart_items().is_empty());
        assert_eq!(storage.get("acme-cartItems").unwrap().as_deref(), Some("[]"));
    }
}
