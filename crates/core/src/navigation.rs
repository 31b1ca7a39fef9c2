//! Scroll state of the horizontal category strip.
//!
//! The strip overflows horizontally. Arrow buttons on each side are enabled
//! only when there is content to scroll to, and the scroll offset survives
//! page navigations within one browser session through [`SessionStorage`].

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

/// Session storage key holding the strip's last scroll offset.
pub const SCROLL_POSITION_KEY: &str = "nav-scroll-position";

/// Distance of one arrow-button scroll, in CSS pixels.
pub const SCROLL_STEP_PX: i64 = 200;

/// How a programmatic scroll is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    /// Jump to the target immediately.
    Instant,
    /// Animate towards the target.
    Smooth,
}

/// A horizontally scrollable container.
pub trait ScrollContainer {
    /// Current horizontal offset.
    fn scroll_left(&self) -> i64;
    /// Total content width.
    fn scroll_width(&self) -> i64;
    /// Visible width.
    fn client_width(&self) -> i64;
    /// Jump to an offset.
    fn set_scroll_left(&mut self, offset: i64);
    /// Scroll by a relative amount.
    fn scroll_by(&mut self, delta: i64, behavior: ScrollBehavior);
}

/// String key/value storage scoped to one browser session.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String);
}

/// In-memory session storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    items: HashMap<String, String>,
}

impl MemorySessionStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }
}

/// Derived scroll state of the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NavigationScrollState {
    pub scroll_offset: i64,
    pub can_scroll_left: bool,
    pub can_scroll_right: bool,
}

impl NavigationScrollState {
    /// Compute the affordances from container geometry.
    #[must_use]
    pub const fn from_geometry(scroll_left: i64, scroll_width: i64, client_width: i64) -> Self {
        Self {
            scroll_offset: scroll_left,
            can_scroll_left: scroll_left > 0,
            can_scroll_right: scroll_left < scroll_width - client_width,
        }
    }
}

/// The category strip bound to its scroll container.
#[derive(Debug)]
pub struct ScrollableNavigation<C> {
    container: C,
    state: NavigationScrollState,
}

impl<C: ScrollContainer> ScrollableNavigation<C> {
    /// Bind to a container. Affordances start disabled until [`Self::mount`].
    pub fn new(container: C) -> Self {
        Self {
            container,
            state: NavigationScrollState::default(),
        }
    }

    /// Restore the stored offset (if any) and compute the affordances.
    ///
    /// The restore is a jump, not an animated scroll. Stored values that are
    /// not base-10 integers are ignored.
    pub fn mount(&mut self, storage: &impl SessionStorage) -> NavigationScrollState {
        if let Some(saved) = storage.get_item(SCROLL_POSITION_KEY) {
            match saved.trim().parse::<i64>() {
                Ok(offset) => self.container.set_scroll_left(offset),
                Err(e) => debug!(value = %saved, error = %e, "Ignoring stored scroll position"),
            }
        }
        self.check_scroll_buttons()
    }

    /// Handle a scroll event: recompute affordances and persist the offset.
    pub fn on_scroll(&mut self, storage: &mut impl SessionStorage) -> NavigationScrollState {
        let state = self.check_scroll_buttons();
        storage.set_item(SCROLL_POSITION_KEY, state.scroll_offset.to_string());
        state
    }

    /// Recompute `can_scroll_left` / `can_scroll_right` from live geometry.
    pub fn check_scroll_buttons(&mut self) -> NavigationScrollState {
        self.state = NavigationScrollState::from_geometry(
            self.container.scroll_left(),
            self.container.scroll_width(),
            self.container.client_width(),
        );
        self.state
    }

    /// Request a smooth scroll one step to the left.
    pub fn scroll_left(&mut self) {
        self.container.scroll_by(-SCROLL_STEP_PX, ScrollBehavior::Smooth);
    }

    /// Request a smooth scroll one step to the right.
    pub fn scroll_right(&mut self) {
        self.container.scroll_by(SCROLL_STEP_PX, ScrollBehavior::Smooth);
    }

    /// Affordances as of the last check.
    #[must_use]
    pub const fn state(&self) -> NavigationScrollState {
        self.state
    }

    #[must_use]
    pub const fn container(&self) -> &C {
        &self.container
    }

    pub const fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }
}
