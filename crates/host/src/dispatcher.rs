//! Executes widget commands against the host page and store.

use std::sync::Arc;

use modamatch_core::Command;
use modamatch_core::protocol::{AnalyticsEvent, ProtocolError};
use serde_json::Value;

use crate::analytics::AnalyticsSink;
use crate::error::HostError;
use crate::overlay::Overlay;
use crate::platform::HostPlatform;

/// Command dispatcher bound to one platform strategy.
#[derive(Clone)]
pub struct Dispatcher {
    platform: Arc<dyn HostPlatform>,
    overlay: Arc<Overlay>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    shop_id: Option<String>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("platform", &self.platform.platform())
            .field("overlay", &self.overlay)
            .field("analytics", &self.analytics.is_some())
            .field("shop_id", &self.shop_id)
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(platform: Arc<dyn HostPlatform>, overlay: Arc<Overlay>) -> Self {
        Self {
            platform,
            overlay,
            analytics: None,
            shop_id: None,
        }
    }

    /// Forward analytics to `sink` instead of dropping them.
    #[must_use]
    pub fn with_analytics(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(sink);
        self
    }

    /// Label overlay open/close events with `shop_id`.
    #[must_use]
    pub fn with_shop_id(mut self, shop_id: impl Into<String>) -> Self {
        self.shop_id = Some(shop_id.into());
        self
    }

    #[must_use]
    pub fn overlay(&self) -> &Arc<Overlay> {
        &self.overlay
    }

    /// Handle one command.
    ///
    /// Only `AddCart` can fail; every other command resolves, falling back to
    /// defaults where the page exposes nothing.
    ///
    /// # Errors
    ///
    /// Returns `HostError::HostOperationFailed` when the store rejects the
    /// cart lines, or `HostError::Http` when it cannot be reached.
    #[tracing::instrument(skip(self, command), fields(kind = %command.message_type()))]
    pub async fn handle(&self, command: Command) -> Result<Value, HostError> {
        match command {
            Command::GetCustomer => {
                Ok(serde_json::to_value(self.platform.customer()).map_err(ProtocolError::from)?)
            }
            Command::GetCurrency => {
                Ok(serde_json::to_value(self.platform.currency()).map_err(ProtocolError::from)?)
            }
            Command::AddCart(params) => self.platform.add_to_cart(&params.items).await,
            Command::Checkout => {
                let url = self.platform.checkout_url()?;
                self.overlay.navigate(url);
                self.close_overlay();
                Ok(Value::Null)
            }
            Command::Close => {
                self.close_overlay();
                Ok(Value::Null)
            }
            Command::PageView(page_view) => {
                if let Some(sink) = &self.analytics {
                    sink.page_view(&page_view);
                }
                Ok(Value::Null)
            }
            Command::Event(event) => {
                if let Some(sink) = &self.analytics {
                    sink.event(&event);
                }
                Ok(Value::Null)
            }
        }
    }

    /// Open the overlay from the launcher button.
    pub fn open_overlay(&self) {
        self.overlay.open();
        self.app_event("Opened");
    }

    fn close_overlay(&self) {
        self.overlay.close();
        self.app_event("Closed");
    }

    fn app_event(&self, action: &str) {
        if let Some(sink) = &self.analytics {
            sink.event(&AnalyticsEvent {
                category: "App".to_owned(),
                action: action.to_owned(),
                label: self.shop_id.clone(),
                value: None,
            });
        }
    }
}
