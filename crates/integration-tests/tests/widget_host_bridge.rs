//! Widget calls answered end to end by the host bridge.
//!
//! The widget's messenger and the host bridge run as separate tasks joined by
//! channels; store carts are local axum servers.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use modamatch_core::protocol::AnalyticsEvent;
use modamatch_core::{CartItem, ClothingType, Platform, SelectedOptions};
use modamatch_host::analytics::Hit;
use modamatch_host::platform::ShopifyPlatform;
use modamatch_host::{
    Bridge, Dispatcher, HostConfig, MemoryAnalytics, Overlay, PageContext, build_bridge,
};
use modamatch_integration_tests::{EMBED_ORIGIN, connect, overlay, product, serve};
use modamatch_widget::MessengerError;
use serde_json::{Value, json};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(2);

fn page() -> PageContext {
    PageContext {
        customer_id: Some("cust-88".to_owned()),
        customer_email: Some("ana@example.com".to_owned()),
        locale: Some("fr".to_owned()),
        currency_code: Some("EUR".to_owned()),
        currency_rate: Some("0.92".to_owned()),
    }
}

fn shopify_bridge(site: Url, page: PageContext) -> (Bridge, Arc<MemoryAnalytics>) {
    let analytics = Arc::new(MemoryAnalytics::new());
    let platform = Arc::new(ShopifyPlatform::new(reqwest::Client::new(), site, page));
    let dispatcher = Dispatcher::new(platform, Arc::new(Overlay::new()))
        .with_analytics(analytics.clone())
        .with_shop_id("acme.myshopify.com");
    (Bridge::new(EMBED_ORIGIN, dispatcher), analytics)
}

/// Built from configuration, the way a theme embeds the bridge.
fn woocommerce_bridge(site: Url) -> Bridge {
    let config = HostConfig {
        embed_origin: EMBED_ORIGIN.to_owned(),
        platform: Platform::Woocommerce,
        site_url: site,
        shop_id: Some("shop-1".to_owned()),
    };
    build_bridge(&config, PageContext::default()).unwrap()
}

fn unused_site() -> Url {
    Url::parse("http://127.0.0.1:9").unwrap()
}

fn cart() -> Vec<CartItem> {
    let shirt = product("shirt", "c-shirts", ClothingType::Top, &["S", "M", "L"]);
    let jeans = product("jeans", "c-jeans", ClothingType::Bottom, &["30", "32"]);
    vec![
        CartItem::build(
            &shirt,
            Some(SelectedOptions {
                size: Some("M".to_owned()),
                color: None,
            }),
        ),
        CartItem::build(&jeans, None),
    ]
}

// =============================================================================
// Page Values
// =============================================================================

#[tokio::test]
async fn test_customer_and_currency_from_page() {
    let (bridge, _) = shopify_bridge(unused_site(), page());
    let client = connect(EMBED_ORIGIN, bridge, TIMEOUT);

    let customer = client.get_customer().await;
    assert_eq!(customer.id.as_deref(), Some("cust-88"));
    assert_eq!(customer.email.as_deref(), Some("ana@example.com"));
    assert_eq!(customer.locale, "fr");

    let currency = client.get_currency().await;
    assert_eq!(currency.active, "EUR");
    assert_eq!(currency.rate, "0.92");
}

#[tokio::test]
async fn test_currency_defaults_without_page_values() {
    let (bridge, _) = shopify_bridge(unused_site(), PageContext::default());
    let client = connect(EMBED_ORIGIN, bridge, TIMEOUT);

    let currency = client.get_currency().await;
    assert_eq!(currency.active, "USD");
    assert_eq!(currency.rate, "1.0");
}

// =============================================================================
// Shopify Cart and Checkout
// =============================================================================

#[tokio::test]
async fn test_shopify_add_to_cart_then_checkout() {
    let received: Arc<Mutex<Vec<Value>>> = Arc::default();
    let app = Router::new()
        .route(
            "/cart/add.js",
            post(
                |State(received): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
                    received.lock().unwrap().push(body.clone());
                    Json(body)
                },
            ),
        )
        .with_state(received.clone());
    let site = serve(app).await.unwrap();

    let (bridge, analytics) = shopify_bridge(site.clone(), page());
    let overlay = overlay(&bridge);
    bridge.dispatcher().open_overlay();
    let client = connect(EMBED_ORIGIN, bridge, TIMEOUT);

    let echoed = client.add_to_cart(&cart()).await.unwrap();
    assert_eq!(
        echoed,
        json!({"items": [{"id": 101, "quantity": 1}, {"id": 100, "quantity": 1}]})
    );
    assert_eq!(received.lock().unwrap().len(), 1);

    client.checkout().await.unwrap();

    let state = overlay.state();
    assert!(!state.visible);
    assert!(!state.scroll_locked);
    assert_eq!(
        state.location.unwrap().as_str(),
        site.join("checkout").unwrap().as_str()
    );

    let actions: Vec<String> = analytics
        .hits()
        .into_iter()
        .filter_map(|hit| match hit {
            Hit::Event(event) if event.category == "App" => Some(event.action),
            _ => None,
        })
        .collect();
    assert_eq!(actions, vec!["Opened", "Closed"]);
}

#[tokio::test]
async fn test_shopify_rejection_reaches_widget() {
    let app = Router::new().route(
        "/cart/add.js",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"status": 422, "description": "All 1 Shirt - M are in your cart."})),
            )
        }),
    );
    let site = serve(app).await.unwrap();
    let (bridge, _) = shopify_bridge(site, page());
    let client = connect(EMBED_ORIGIN, bridge, TIMEOUT);

    let err = client.add_to_cart(&cart()).await.unwrap_err();

    match err {
        MessengerError::HostOperationFailed(body) => {
            assert_eq!(body["status"], 422);
            assert_eq!(body["description"], "All 1 Shirt - M are in your cart.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Signals when the store receives a cart add, then holds it until released.
#[derive(Default)]
struct HeldCart {
    arrived: tokio::sync::Notify,
    release: tokio::sync::Notify,
}

#[tokio::test]
async fn test_slow_cart_add_does_not_hold_up_other_calls() {
    let held = Arc::new(HeldCart::default());
    let app = Router::new()
        .route(
            "/cart/add.js",
            post(
                |State(held): State<Arc<HeldCart>>, Json(body): Json<Value>| async move {
                    held.arrived.notify_one();
                    held.release.notified().await;
                    Json(body)
                },
            ),
        )
        .with_state(held.clone());
    let site = serve(app).await.unwrap();
    let (bridge, _) = shopify_bridge(site, page());
    let client = Arc::new(connect(EMBED_ORIGIN, bridge, TIMEOUT));

    let adding = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.add_to_cart(&cart()).await }
    });
    held.arrived.notified().await;

    let customer = client.get_customer().await;
    assert_eq!(customer.locale, "fr");

    held.release.notify_one();
    assert!(adding.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_close_hides_overlay() {
    let (bridge, _) = shopify_bridge(unused_site(), page());
    let overlay = overlay(&bridge);
    bridge.dispatcher().open_overlay();
    assert!(overlay.state().visible);

    let client = connect(EMBED_ORIGIN, bridge, TIMEOUT);
    client.close().await.unwrap();

    let state = overlay.state();
    assert!(!state.visible);
    assert!(state.location.is_none());
}

// =============================================================================
// WooCommerce Cart
// =============================================================================

#[tokio::test]
async fn test_woocommerce_adds_lines_one_by_one() {
    let received: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
    let app = Router::new()
        .route(
            "/cart/",
            get(
                |State(received): State<Arc<Mutex<Vec<HashMap<String, String>>>>>,
                 Query(query): Query<HashMap<String, String>>| async move {
                    received.lock().unwrap().push(query);
                    StatusCode::OK
                },
            ),
        )
        .with_state(received.clone());
    let site = serve(app).await.unwrap();
    let client = connect(EMBED_ORIGIN, woocommerce_bridge(site), TIMEOUT);

    let last_status = client.add_to_cart(&cart()).await.unwrap();
    assert_eq!(last_status, json!(200));

    let received = received.lock().unwrap();
    let added: Vec<(&str, &str)> = received
        .iter()
        .map(|query| (query["add-to-cart"].as_str(), query["quantity"].as_str()))
        .collect();
    assert_eq!(added, vec![("101", "1"), ("100", "1")]);
}

#[tokio::test]
async fn test_woocommerce_rejection_reports_status() {
    let app = Router::new().route("/cart/", get(|| async { StatusCode::NOT_FOUND }));
    let site = serve(app).await.unwrap();
    let client = connect(EMBED_ORIGIN, woocommerce_bridge(site), TIMEOUT);

    let err = client.add_to_cart(&cart()).await.unwrap_err();

    match err {
        MessengerError::HostOperationFailed(body) => {
            assert_eq!(body["message"], "Add to cart responded with code 404");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// Origin Check
// =============================================================================

#[tokio::test]
async fn test_foreign_origin_is_never_answered() {
    let (bridge, analytics) = shopify_bridge(unused_site(), page());
    let client = connect(
        "https://evil.example.com",
        bridge,
        Duration::from_millis(150),
    );

    let err = client.checkout().await.unwrap_err();

    assert!(matches!(err, MessengerError::Timeout { .. }));
    assert!(analytics.hits().is_empty());
}

// =============================================================================
// Analytics
// =============================================================================

#[tokio::test]
async fn test_page_views_and_events_are_forwarded() {
    let (bridge, analytics) = shopify_bridge(unused_site(), page());
    let client = connect(EMBED_ORIGIN, bridge, TIMEOUT);

    client
        .page_view("/fitting-room", Some("Fitting room".to_owned()))
        .await;
    client
        .event(AnalyticsEvent {
            category: "Fitting".to_owned(),
            action: "Add".to_owned(),
            label: Some("shirt".to_owned()),
            value: Some(1),
        })
        .await;

    match analytics.hits().as_slice() {
        [Hit::PageView(view), Hit::Event(event)] => {
            assert_eq!(view.url, "/fitting-room");
            assert_eq!(event.action, "Add");
        }
        other => panic!("unexpected hits: {other:?}"),
    }
}
