//! Browser-reported geometry.
//!
//! The browser owns the real DOM. It reports the cart button's bounding box
//! and the category strip's scroll geometry, and these types stand in for the
//! elements on the server side.

use std::sync::{Mutex, PoisonError};

use quickcart_core::{CartAnchor, Rect, ScrollBehavior, ScrollContainer};
use serde::Serialize;

/// The cart button, as last reported by the browser.
#[derive(Debug, Default)]
pub struct ReportedAnchor {
    rect: Mutex<Rect>,
}

impl ReportedAnchor {
    /// Record a new bounding box (resize, scroll, re-render).
    pub fn report(&self, rect: Rect) {
        *self.rect.lock().unwrap_or_else(PoisonError::into_inner) = rect;
    }
}

impl CartAnchor for ReportedAnchor {
    fn bounding_rect(&self) -> Rect {
        *self.rect.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A scroll the browser should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrollRequest {
    pub delta: i64,
    pub behavior: ScrollBehavior,
}

/// The category strip's scroll container, as last reported by the browser.
///
/// Programmatic scrolls are applied to the reported offset (clamped like a
/// browser would) and queued as a [`ScrollRequest`] for the browser to carry
/// out. The next reported scroll event overwrites the prediction.
#[derive(Debug, Clone, Default)]
pub struct ReportedScrollContainer {
    scroll_left: i64,
    scroll_width: i64,
    client_width: i64,
    pending: Option<ScrollRequest>,
}

impl ReportedScrollContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record live geometry from a scroll or resize event.
    pub fn report(&mut self, scroll_left: i64, scroll_width: i64, client_width: i64) {
        self.scroll_width = scroll_width.max(0);
        self.client_width = client_width.max(0);
        self.scroll_left = scroll_left;
    }

    /// Take the last requested scroll, if any.
    pub const fn take_request(&mut self) -> Option<ScrollRequest> {
        self.pending.take()
    }

    const fn max_offset(&self) -> i64 {
        let max = self.scroll_width - self.client_width;
        if max > 0 { max } else { 0 }
    }
}

impl ScrollContainer for ReportedScrollContainer {
    fn scroll_left(&self) -> i64 {
        self.scroll_left
    }

    fn scroll_width(&self) -> i64 {
        self.scroll_width
    }

    fn client_width(&self) -> i64 {
        self.client_width
    }

    fn set_scroll_left(&mut self, offset: i64) {
        self.scroll_left = offset.clamp(0, self.max_offset());
    }

    fn scroll_by(&mut self, delta: i64, behavior: ScrollBehavior) {
        self.pending = Some(ScrollRequest { delta, behavior });
        self.set_scroll_left(self.scroll_left.saturating_add(delta));
    }
}
