//! The full-screen overlay that hosts the widget frame.

use std::sync::{Mutex, PoisonError};

use url::Url;

/// Observable overlay and page state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayState {
    /// Overlay is displayed over the store page
    pub visible: bool,
    /// Page scrolling is disabled behind the overlay
    pub scroll_locked: bool,
    /// Where the page was sent, if it navigated away
    pub location: Option<Url>,
    /// Times the widget frame was reset to its start URL
    pub frame_resets: u32,
}

/// Overlay controller shared between the launcher button and the bridge.
#[derive(Debug, Default)]
pub struct Overlay {
    state: Mutex<OverlayState>,
}

impl Overlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> OverlayState {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    /// Show the overlay and lock page scroll.
    pub fn open(&self) {
        let mut state = self.lock();
        state.visible = true;
        state.scroll_locked = true;
    }

    /// Hide the overlay, restore page scroll and reset the frame so the next
    /// open starts fresh.
    pub fn close(&self) {
        let mut state = self.lock();
        state.visible = false;
        state.scroll_locked = false;
        state.frame_resets = state.frame_resets.saturating_add(1);
    }

    /// Navigate the host page.
    pub fn navigate(&self, url: Url) {
        tracing::info!(%url, "Navigating host page");
        self.lock().location = Some(url);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OverlayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
