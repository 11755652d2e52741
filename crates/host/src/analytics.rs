//! Analytics forwarding.
//!
//! The widget reports page views and events through the host so they land in
//! the store's own analytics property. A bridge without a sink drops them.

use std::sync::{Mutex, PoisonError};

use modamatch_core::protocol::{AnalyticsEvent, PageView};

/// Destination for widget analytics.
pub trait AnalyticsSink: Send + Sync {
    fn page_view(&self, page_view: &PageView);
    fn event(&self, event: &AnalyticsEvent);
}

/// Writes analytics as structured log records under the `modamatch::analytics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn page_view(&self, page_view: &PageView) {
        tracing::info!(
            target: "modamatch::analytics",
            page = %page_view.url,
            title = page_view.title.as_deref(),
            "pageview"
        );
    }

    fn event(&self, event: &AnalyticsEvent) {
        tracing::info!(
            target: "modamatch::analytics",
            category = %event.category,
            action = %event.action,
            label = event.label.as_deref(),
            value = event.value,
            "event"
        );
    }
}

/// A recorded analytics hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    PageView(PageView),
    Event(AnalyticsEvent),
}

/// Keeps every hit in memory, for previews and tests.
#[derive(Debug, Default)]
pub struct MemoryAnalytics {
    hits: Mutex<Vec<Hit>>,
}

impl MemoryAnalytics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn hits(&self) -> Vec<Hit> {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, hit: Hit) {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hit);
    }
}

impl AnalyticsSink for MemoryAnalytics {
    fn page_view(&self, page_view: &PageView) {
        self.push(Hit::PageView(page_view.clone()));
    }

    fn event(&self, event: &AnalyticsEvent) {
        self.push(Hit::Event(event.clone()));
    }
}
