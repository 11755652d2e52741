//! Persisted widget settings.
//!
//! Reads the same files the widget writes, so a shopper's fitting list and
//! cart can be inspected or reset while debugging a store.

use std::path::PathBuf;

use modamatch_core::StoreId;
use modamatch_core::settings::{MODEL_KEY, cart_items_key, fitting_items_key};
use modamatch_widget::{FileStorage, SettingsStorage, SettingsStore, StorageError, WidgetConfig};

fn open(dir: Option<PathBuf>) -> Result<FileStorage, Box<dyn std::error::Error>> {
    let dir = match dir {
        Some(dir) => dir,
        None => WidgetConfig::from_env()?.settings_dir,
    };
    Ok(FileStorage::open(dir)?)
}

/// Settings saved for `store_id`, as pretty JSON.
///
/// # Errors
///
/// Returns an error if the settings directory cannot be opened.
pub fn show(store_id: &str, dir: Option<PathBuf>) -> Result<String, Box<dyn std::error::Error>> {
    let store = SettingsStore::load(StoreId::new(store_id), open(dir)?);
    Ok(serde_json::to_string_pretty(store.settings())?)
}

/// Remove the fitting list and cart saved for `store_id`, and the selected
/// model.
///
/// # Errors
///
/// Returns an error if the directory cannot be opened or a file cannot be
/// removed.
pub fn clear(store_id: &str, dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open(dir)?;
    remove_all(&storage, store_id)?;
    tracing::info!(store_id, "Cleared shopper settings");
    Ok(())
}

fn remove_all(storage: &impl SettingsStorage, store_id: &str) -> Result<(), StorageError> {
    storage.remove(&fitting_items_key(store_id))?;
    storage.remove(&cart_items_key(store_id))?;
    storage.remove(MODEL_KEY)
}
