//! Open-cart coordinator.
//!
//! Components that want the cart panel to open after an add-to-cart go
//! through [`OpenCartCoordinator::open_cart_modal`] rather than touching the
//! [`CartStore`] directly. The coordinator also tracks the on-screen cart
//! button, which is the destination of add-to-cart animations.

use std::sync::Arc;

use crate::cart::CartStore;
use crate::types::{Point, Rect};

/// The on-screen cart button.
///
/// Implementations report live geometry: the rect is read on every call, so
/// an anchor that moved (resize, scroll) reports its new position.
pub trait CartAnchor: Send + Sync {
    /// Current bounding box in viewport coordinates.
    fn bounding_rect(&self) -> Rect;
}

/// Tracks the cart-button anchor and opens the cart panel.
#[derive(Clone, Default)]
pub struct OpenCartCoordinator {
    anchor: Option<Arc<dyn CartAnchor>>,
}

impl std::fmt::Debug for OpenCartCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenCartCoordinator")
            .field("has_anchor", &self.anchor.is_some())
            .finish()
    }
}

impl OpenCartCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the cart button. The last registration wins; `None` clears it.
    pub fn set_cart_button_ref(&mut self, anchor: Option<Arc<dyn CartAnchor>>) {
        self.anchor = anchor;
    }

    /// Center of the cart button, or `None` if no button is registered.
    ///
    /// Never cached: the value is stale as soon as layout changes.
    #[must_use]
    pub fn cart_button_position(&self) -> Option<Point> {
        self.anchor
            .as_ref()
            .map(|anchor| anchor.bounding_rect().center())
    }

    /// Open the cart panel.
    pub fn open_cart_modal(&self, cart: &mut CartStore) {
        cart.open_cart_modal();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct MovingAnchor {
        rect: Mutex<Rect>,
    }

    impl CartAnchor for MovingAnchor {
        fn bounding_rect(&self) -> Rect {
            self.rect.lock().map(|r| *r).unwrap_or_default()
        }
    }

    #[test]
    fn test_position_unavailable_without_anchor() {
        let coordinator = OpenCartCoordinator::new();
        assert_eq!(coordinator.cart_button_position(), None);
    }

    #[test]
    fn test_position_is_recomputed_each_call() {
        let anchor = Arc::new(MovingAnchor {
            rect: Mutex::new(Rect::new(0.0, 0.0, 20.0, 20.0)),
        });
        let mut coordinator = OpenCartCoordinator::new();
        coordinator.set_cart_button_ref(Some(Arc::clone(&anchor) as Arc<dyn CartAnchor>));
        assert_eq!(coordinator.cart_button_position(), Some(Point::new(10.0, 10.0)));

        if let Ok(mut rect) = anchor.rect.lock() {
            *rect = Rect::new(500.0, 8.0, 40.0, 24.0);
        }
        assert_eq!(coordinator.cart_button_position(), Some(Point::new(520.0, 20.0)));
    }

    #[test]
    fn test_last_registration_wins() {
        let first = Arc::new(MovingAnchor {
            rect: Mutex::new(Rect::new(0.0, 0.0, 10.0, 10.0)),
        });
        let second = Arc::new(MovingAnchor {
            rect: Mutex::new(Rect::new(100.0, 100.0, 10.0, 10.0)),
        });
        let mut coordinator = OpenCartCoordinator::new();
        coordinator.set_cart_button_ref(Some(first));
        coordinator.set_cart_button_ref(Some(second));
        assert_eq!(coordinator.cart_button_position(), Some(Point::new(105.0, 105.0)));

        coordinator.set_cart_button_ref(None);
        assert_eq!(coordinator.cart_button_position(), None);
    }

    #[test]
    fn test_open_cart_modal_delegates_to_store() {
        let coordinator = OpenCartCoordinator::new();
        let mut cart = CartStore::new();
        coordinator.open_cart_modal(&mut cart);
        assert!(cart.is_modal_open());
        coordinator.open_cart_modal(&mut cart);
        assert!(cart.is_modal_open());
    }
}
