//! Typed calls from the widget to the host page.

use modamatch_core::protocol::{AddCart, AnalyticsEvent, PageView};
use modamatch_core::{CartItem, Command, Currency, CustomerData, StoreId};
use serde_json::Value;

use crate::error::MessengerError;
use crate::messenger::Messenger;

/// Widget-side client for host page operations.
///
/// Without a store id the widget is not running inside a host page; every
/// call is then skipped and resolves to an empty payload.
#[derive(Debug, Clone)]
pub struct EmbedClient {
    messenger: Messenger,
    store_id: Option<StoreId>,
}

impl EmbedClient {
    #[must_use]
    pub const fn new(messenger: Messenger, store_id: Option<StoreId>) -> Self {
        Self {
            messenger,
            store_id,
        }
    }

    #[must_use]
    pub const fn store_id(&self) -> Option<&StoreId> {
        self.store_id.as_ref()
    }

    async fn send(&self, command: Command) -> Result<Value, MessengerError> {
        if self.store_id.is_none() {
            tracing::debug!(kind = %command.message_type(), "No store id, skipping host call");
            return Ok(Value::Null);
        }
        self.messenger.send(command).await
    }

    /// The signed-in customer, or defaults when the host cannot say.
    pub async fn get_customer(&self) -> CustomerData {
        match self.send(Command::GetCustomer).await {
            Ok(Value::Null) => CustomerData::default(),
            Ok(payload) => serde_json::from_value(payload).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Could not decode customer from host");
                CustomerData::default()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch customer from host");
                CustomerData::default()
            }
        }
    }

    /// The active currency, or USD at rate 1.0 when the host cannot say.
    pub async fn get_currency(&self) -> Currency {
        match self.send(Command::GetCurrency).await {
            Ok(Value::Null) => Currency::default(),
            Ok(payload) => serde_json::from_value(payload).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Could not decode currency from host");
                Currency::default()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch currency from host");
                Currency::default()
            }
        }
    }

    /// Push cart lines into the host store's cart.
    ///
    /// # Errors
    ///
    /// Returns `MessengerError::HostOperationFailed` with the host's error body
    /// when the store rejects the lines.
    pub async fn add_to_cart(&self, items: &[CartItem]) -> Result<Value, MessengerError> {
        let items = items.iter().map(CartItem::line_item).collect();
        self.send(Command::AddCart(AddCart { items })).await
    }

    /// Send the shopper to the host checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the host did not acknowledge in time.
    pub async fn checkout(&self) -> Result<(), MessengerError> {
        self.send(Command::Checkout).await.map(drop)
    }

    /// Close the overlay.
    ///
    /// # Errors
    ///
    /// Returns an error if the host did not acknowledge in time.
    pub async fn close(&self) -> Result<(), MessengerError> {
        self.send(Command::Close).await.map(drop)
    }

    /// Record a page view. Failures are logged only.
    pub async fn page_view(&self, url: impl Into<String>, title: Option<String>) {
        let command = Command::PageView(PageView {
            url: url.into(),
            title,
        });
        if let Err(e) = self.send(command).await {
            tracing::debug!(error = %e, "Page view not recorded");
        }
    }

    /// Record an analytics event. Failures are logged only.
    pub async fn event(&self, event: AnalyticsEvent) {
        if let Err(e) = self.send(Command::Event(event)).await {
            tracing::debug!(error = %e, "Analytics event not recorded");
        }
    }
}
