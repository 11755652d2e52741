//! ModaMatch Host - The store-side half of the widget bridge.
//!
//! Runs on the store's page next to the widget frame. Frames from the
//! widget's origin are decoded into commands and executed against the
//! store's native cart and page through a [`platform::HostPlatform`]
//! strategy fixed at construction.
//!
//! # Modules
//!
//! - [`bridge`] - Origin-guarded request loop
//! - [`dispatcher`] - Command execution
//! - [`platform`] - Shopify and WooCommerce strategies
//! - [`overlay`] - Overlay visibility and page navigation
//! - [`analytics`] - Analytics forwarding
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod overlay;
pub mod platform;

use std::sync::Arc;

pub use analytics::{AnalyticsSink, MemoryAnalytics, TracingAnalytics};
pub use bridge::Bridge;
pub use config::HostConfig;
pub use dispatcher::Dispatcher;
pub use error::HostError;
pub use overlay::Overlay;
pub use platform::{HostPlatform, PageContext};

/// Build a bridge for `config` with the page values the theme exposed.
///
/// Analytics go to the log through [`TracingAnalytics`].
///
/// # Errors
///
/// Returns `HostError::Http` if the HTTP client cannot be built.
pub fn build_bridge(config: &HostConfig, page: PageContext) -> Result<Bridge, HostError> {
    let platform = platform::for_platform(config.platform, config.site_url.clone(), page)?;
    let mut dispatcher = Dispatcher::new(platform, Arc::new(Overlay::new()))
        .with_analytics(Arc::new(TracingAnalytics));
    if let Some(shop_id) = &config.shop_id {
        dispatcher = dispatcher.with_shop_id(shop_id.clone());
    }
    Ok(Bridge::new(config.embed_origin.clone(), dispatcher))
}
