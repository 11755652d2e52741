//! Webhook handlers keeping the product cache in sync.
//!
//! Every handler reads the raw body so signatures can be checked against
//! the exact bytes that were signed. Accepted webhooks answer `200` with an
//! empty body, including the ones that turn out to be no-ops.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, info, instrument};

use modamatch_core::{CategoryId, Platform};

use crate::db::{
    CategoryRepository, ProductRepository, RepositoryError, StoreRecord, StoreRepository,
};
use crate::error::WebhookError;
use crate::state::AppState;
use crate::sync::contentful::{ContentEvent, ContentType, Entry, ItemSkip};
use crate::sync::shopify::ShopifyProduct;
use crate::sync::woocommerce::WooProduct;
use crate::sync::{StoreEvent, SyncAction, remove_store_data, unlink_content};
use crate::webhook::{
    CONTENTFUL_SECRET, CONTENTFUL_TOPIC, SHOPIFY_SHOP_DOMAIN, SHOPIFY_SIGNATURE, SHOPIFY_TOPIC,
    WOOCOMMERCE_EVENT, WOOCOMMERCE_SIGNATURE, verify_shared_secret, verify_signature,
};

fn header<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Find the store a webhook claims to come from and check its signature.
async fn authenticate(
    state: &AppState,
    shop_name: &str,
    platform: Platform,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), WebhookError> {
    let store = state
        .store(shop_name)
        .await?
        .filter(|store| store.platform == platform)
        .ok_or(WebhookError::MissingShopName)?;

    verify_signature(&store.secret_key, body, signature.unwrap_or_default())?;
    debug!(shop_name, "Webhook signature verified");
    Ok(())
}

async fn apply(products: &ProductRepository<'_>, action: SyncAction) -> Result<(), RepositoryError> {
    match action {
        SyncAction::Save(product) => products.save(&product).await,
        SyncAction::Delete(id) => products.delete(&id).await,
        SyncAction::Skip => Ok(()),
    }
}

/// Handle a Shopify product webhook.
#[instrument(skip(state, headers, body))]
pub async fn shopify_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let payload: ShopifyProduct =
        serde_json::from_slice(&body).map_err(WebhookError::MalformedBody)?;
    let shop_name = header(&headers, SHOPIFY_SHOP_DOMAIN).ok_or(WebhookError::MissingShopName)?;

    authenticate(
        &state,
        shop_name,
        Platform::Shopify,
        &body,
        header(&headers, SHOPIFY_SIGNATURE),
    )
    .await?;

    let topic = header(&headers, SHOPIFY_TOPIC).unwrap_or_default();
    let event = payload
        .event(topic)
        .ok_or_else(|| WebhookError::InvalidEvent(topic.to_owned()))?;

    let products = ProductRepository::new(state.pool());
    let existing = products
        .get_by_external_id(Platform::Shopify, shop_name, payload.external_id())
        .await?;

    let action = match event {
        StoreEvent::Upsert => SyncAction::Save(Box::new(payload.apply(existing, shop_name))),
        StoreEvent::Remove => remove_store_data(existing),
    };
    info!(shop_name, topic, product_id = payload.id, "Shopify product synced");
    apply(&products, action).await?;

    Ok(StatusCode::OK)
}

/// Handle a WooCommerce product or variation webhook.
#[instrument(skip(state, headers, body))]
pub async fn woocommerce_product(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let payload: WooProduct =
        serde_json::from_slice(&body).map_err(WebhookError::MalformedBody)?;
    let shop_name = shop_id.trim();
    if shop_name.is_empty() {
        return Err(WebhookError::MissingShopName);
    }

    authenticate(
        &state,
        shop_name,
        Platform::Woocommerce,
        &body,
        header(&headers, WOOCOMMERCE_SIGNATURE),
    )
    .await?;

    let event_name = header(&headers, WOOCOMMERCE_EVENT).unwrap_or_default();
    let event = payload
        .event(event_name)
        .ok_or_else(|| WebhookError::InvalidEvent(event_name.to_owned()))?;

    let products = ProductRepository::new(state.pool());
    let action = match event {
        StoreEvent::Upsert if payload.is_variation() => {
            let parent = products
                .get_by_external_id(Platform::Woocommerce, shop_name, payload.parent_external_id())
                .await?;
            payload.apply_variation(parent)
        }
        StoreEvent::Upsert => {
            let existing = products
                .get_by_external_id(Platform::Woocommerce, shop_name, payload.external_id())
                .await?;
            SyncAction::Save(Box::new(payload.apply_product(existing, shop_name)))
        }
        StoreEvent::Remove => {
            let existing = products
                .get_by_external_id(Platform::Woocommerce, shop_name, payload.external_id())
                .await?;
            remove_store_data(existing)
        }
    };
    info!(shop_name, event = event_name, product_id = payload.id, "WooCommerce product synced");
    apply(&products, action).await?;

    Ok(StatusCode::OK)
}

/// Handle a Contentful entry webhook.
#[instrument(skip(state, headers, body))]
pub async fn contentful_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let entry: Entry = serde_json::from_slice(&body).map_err(WebhookError::MalformedBody)?;
    verify_shared_secret(
        &state.config().contentful_webhook_secret,
        header(&headers, CONTENTFUL_SECRET),
    )?;

    let topic = header(&headers, CONTENTFUL_TOPIC).unwrap_or_default();
    let event =
        ContentEvent::classify(topic).ok_or_else(|| WebhookError::InvalidEvent(topic.to_owned()))?;

    match entry.content_type() {
        ContentType::Item => sync_item(&state, &entry, event).await?,
        ContentType::Category => sync_category(&state, &entry, event).await?,
        ContentType::Store => sync_store(&state, &entry, event).await?,
        ContentType::Other(content_type) => {
            debug!(%content_type, "Ignoring entry of unhandled content type");
        }
    }

    Ok(StatusCode::OK)
}

async fn sync_item(state: &AppState, entry: &Entry, event: ContentEvent) -> Result<(), WebhookError> {
    let products = ProductRepository::new(state.pool());

    match event {
        ContentEvent::Publish => {
            let link = match entry.item_link() {
                Ok(link) => link,
                Err(ItemSkip::NoProductId) => {
                    info!("Skipping content item without a product id");
                    return Ok(());
                }
                Err(ItemSkip::NoStore) => {
                    info!("Skipping content item without a valid store or product id");
                    return Ok(());
                }
            };

            let store = StoreRepository::new(state.pool())
                .get_by_contentful_id(&link.store_entry_id)
                .await?
                .ok_or(WebhookError::MissingShopName)?;

            let existing = products
                .get_by_external_id(store.platform, &store.shop_name, link.external_id)
                .await?;
            let product = link.apply(existing, store.platform, &store.shop_name);
            info!(
                shop_name = %store.shop_name,
                entry_id = %link.entry_id,
                enabled = product.enabled,
                "Content item linked"
            );
            apply(&products, SyncAction::Save(Box::new(product))).await?;
        }
        ContentEvent::Unpublish => {
            let Some(entry_id) = entry.entry_id() else {
                return Ok(());
            };
            let linked = products.list_by_contentful_id(&entry_id).await?;
            info!(%entry_id, products = linked.len(), "Content item unlinked");
            for product in linked {
                apply(&products, unlink_content(product)).await?;
            }
        }
    }

    Ok(())
}

async fn sync_category(
    state: &AppState,
    entry: &Entry,
    event: ContentEvent,
) -> Result<(), WebhookError> {
    let categories = CategoryRepository::new(state.pool());

    match event {
        ContentEvent::Publish => {
            if let Some(category) = entry.category() {
                info!(category_id = %category.id, "Category updated");
                categories.upsert(&category).await?;
            }
        }
        ContentEvent::Unpublish => {
            if let Some(id) = entry.sys.id.as_deref() {
                info!(category_id = id, "Category removed");
                categories.delete(&CategoryId::new(id)).await?;
            }
        }
    }

    Ok(())
}

async fn sync_store(state: &AppState, entry: &Entry, event: ContentEvent) -> Result<(), WebhookError> {
    let stores = StoreRepository::new(state.pool());

    match event {
        ContentEvent::Publish => {
            let Some(published) = entry.store() else {
                info!("Skipping store entry without a store id or secret");
                return Ok(());
            };

            // A renamed store must not keep verifying under its old name
            if let Some(previous) = stores.get_by_contentful_id(&published.entry_id).await? {
                state.forget_store(&previous.shop_name).await;
            }

            let record = StoreRecord {
                shop_name: published.shop_name,
                platform: published.platform,
                contentful_id: Some(published.entry_id),
                secret_key: published.secret_key,
                enabled: published.enabled,
            };
            stores.upsert(&record).await?;
            state.forget_store(&record.shop_name).await;
            info!(shop_name = %record.shop_name, enabled = record.enabled, "Store updated");
        }
        ContentEvent::Unpublish => {
            let Some(entry_id) = entry.entry_id() else {
                return Ok(());
            };
            if let Some(shop_name) = stores.delete_by_contentful_id(&entry_id).await? {
                state.forget_store(&shop_name).await;
                info!(%shop_name, "Store removed");
            }
        }
    }

    Ok(())
}
