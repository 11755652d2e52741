//! Integration tests for ModaMatch.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p modamatch-integration-tests
//! ```
//!
//! No database or store is needed: the widget and host talk over in-process
//! channels, store carts are local axum servers, and catalog routes are
//! exercised up to the point where they would query `PostgreSQL`.
//!
//! # Test Categories
//!
//! - `widget_host_bridge` - Widget calls answered by the host bridge
//! - `fitting_session` - Settings persistence and fitting-room selection
//! - `catalog_routes` - Catalog HTTP surface and webhook authentication

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use modamatch_core::{
    CategoryId, ClothingType, ContentfulId, Envelope, ExternalProductId, Frame, Platform, Price,
    Product, ProductId, ProductOption, ProductTryOnItems, SizeRef, StoreData, StoreId, TryOnItem,
    TryOnItemId, Variant, VariantId,
};
use modamatch_host::Bridge;
use modamatch_widget::{ChannelTransport, EmbedClient, Messenger};
use tokio::sync::mpsc;
use url::Url;

/// Origin the widget frame is served from in every test.
pub const EMBED_ORIGIN: &str = "https://app.modamatch.test";

/// Store id the widget runs under in every test.
pub const STORE_ID: &str = "acme.myshopify.com";

/// Wire a widget to `bridge` over in-process channels.
///
/// Frames the widget posts are tagged with `widget_origin`, so a mismatch
/// with the bridge's embed origin reproduces a foreign window.
#[must_use]
pub fn connect(widget_origin: &str, bridge: Bridge, timeout: Duration) -> EmbedClient {
    let (to_host, host_inbound) = mpsc::channel::<Envelope>(16);
    let (to_widget, widget_inbound) = mpsc::channel::<Frame>(16);

    let messenger = Messenger::new(ChannelTransport::new(widget_origin, to_host), timeout);
    tokio::spawn(bridge.run(host_inbound, to_widget));
    tokio::spawn(messenger.clone().listen(widget_inbound));

    EmbedClient::new(messenger, Some(StoreId::new(STORE_ID)))
}

/// Serve `app` on an ephemeral local port.
///
/// # Errors
///
/// Returns an error if no local port can be bound.
pub async fn serve(app: Router) -> std::io::Result<Url> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}")).map_err(std::io::Error::other)
}

/// An enabled product with a `Size` option and one variant per size.
#[must_use]
pub fn product(id: &str, category: &str, clothing_type: ClothingType, sizes: &[&str]) -> Product {
    let variants = sizes
        .iter()
        .zip(100_i64..)
        .map(|(size, variant_id)| Variant {
            id: VariantId::new(variant_id),
            product_id: Some(ExternalProductId::new(7)),
            title: Some((*size).to_owned()),
            price: Some(Price::from_cents(4900)),
            option1: Some((*size).to_owned()),
            option2: None,
            option3: None,
        })
        .collect();

    Product {
        id: ProductId::new(id),
        shop_name: STORE_ID.to_owned(),
        platform: Platform::Shopify,
        external_id: ExternalProductId::new(7),
        title: Some(format!("Garment {id}")),
        description: None,
        short_description: None,
        price: Some(Price::from_cents(4900)),
        image_url: Some(format!("https://cdn.modamatch.test/{id}.jpg")),
        main_image_url: None,
        additional_images: Vec::new(),
        contentful_id: Some(ContentfulId::new(format!("item-{id}"))),
        category_id: Some(CategoryId::new(category)),
        clothing_type,
        enabled: true,
        store_data: Some(StoreData {
            options: vec![ProductOption {
                name: "Size".to_owned(),
                position: 1,
                values: sizes.iter().map(|size| (*size).to_owned()).collect(),
            }],
            variants,
        }),
    }
}

/// Try-on assets for `product_id`, one per `(size name, size rank)`.
#[must_use]
pub fn try_on_items(product_id: &str, sizes: &[(&str, i32)]) -> ProductTryOnItems {
    ProductTryOnItems {
        product_id: ProductId::new(product_id),
        all_try_on_items: sizes
            .iter()
            .map(|(name, value)| TryOnItem {
                id: TryOnItemId::new(format!("{product_id}-{name}")),
                size: Some(SizeRef {
                    name: (*name).to_owned(),
                    value: *value,
                }),
                layer_url: format!("https://cdn.modamatch.test/layers/{product_id}-{name}.png"),
                layer_back_url: None,
                category_id: None,
            })
            .collect(),
        all_try_on_item_sizes: sizes.iter().map(|(name, _)| (*name).to_owned()).collect(),
    }
}

/// Shared handle to the overlay a bridge drives.
#[must_use]
pub fn overlay(bridge: &Bridge) -> Arc<modamatch_host::Overlay> {
    Arc::clone(bridge.dispatcher().overlay())
}
