//! Per-shopper state.
//!
//! A [`ShopperSession`] is everything one browser session owns: the cart, the
//! open-cart coordinator with its anchor, the category strip's scroll state
//! and session storage, and the live animations. Handlers receive it
//! explicitly through the [`crate::middleware::Shopper`] extractor; nothing
//! here is process-wide.

mod registry;
mod reported;

pub use registry::{SHOPPER_IDLE_TIMEOUT, SharedShopper, ShopperId, ShopperRegistry, lock};
pub use reported::{ReportedAnchor, ReportedScrollContainer, ScrollRequest};

use std::sync::Arc;

use quickcart_core::{
    CartAnchor, CartError, CartStore, MemorySessionStorage, NavigationScrollState,
    OpenCartCoordinator, Point, Product, ProductId, Rect, ScrollableNavigation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::feedback::{AnimationId, AnimationKind, AnimationLayer, CartFeedback};

/// Which way an arrow button scrolls the category strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Left,
    Right,
}

/// The feedback an add-to-cart produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The cart panel was opened.
    CartOpened,
    /// An animation was started.
    Animated(AnimationId),
}

/// State owned by one browser session.
#[derive(Debug)]
pub struct ShopperSession {
    cart: CartStore,
    open_cart: OpenCartCoordinator,
    anchor: Arc<ReportedAnchor>,
    navigation: ScrollableNavigation<ReportedScrollContainer>,
    storage: MemorySessionStorage,
    animations: AnimationLayer,
}

impl ShopperSession {
    /// Fresh session: empty cart, closed panel, no anchor registered.
    #[must_use]
    pub fn new(max_animations: usize) -> Self {
        Self {
            cart: CartStore::new(),
            open_cart: OpenCartCoordinator::new(),
            anchor: Arc::new(ReportedAnchor::default()),
            navigation: ScrollableNavigation::new(ReportedScrollContainer::new()),
            storage: MemorySessionStorage::new(),
            animations: AnimationLayer::new(max_animations),
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn animations(&self) -> &AnimationLayer {
        &self.animations
    }

    /// Add one unit of `product` and fire exactly one feedback.
    ///
    /// `click` is where the add-to-cart button was clicked. A flying item
    /// needs both the click and a registered cart button, and a confirmation
    /// needs the click; when either is missing the cart panel opens instead.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the product fails validation. The cart is left
    /// untouched and no feedback fires.
    pub fn add_to_cart(
        &mut self,
        product: Arc<Product>,
        click: Option<Point>,
        feedback: CartFeedback,
    ) -> Result<AddOutcome, CartError> {
        let thumbnail = product.thumbnail.clone();
        self.cart.add_to_cart(product)?;

        let kind = match (feedback, click) {
            (CartFeedback::FlyingItem, Some(start)) => self
                .open_cart
                .cart_button_position()
                .map(|end| AnimationKind::FlyingItem {
                    start,
                    end,
                    product_image: thumbnail,
                }),
            (CartFeedback::Confirmation, Some(position)) => {
                Some(AnimationKind::Confirmation { position })
            }
            _ => None,
        };

        match kind {
            Some(kind) => Ok(AddOutcome::Animated(self.animations.start(kind))),
            None => {
                if feedback != CartFeedback::OpenCart {
                    debug!(%feedback, "Animation unavailable, opening cart instead");
                }
                self.open_cart.open_cart_modal(&mut self.cart);
                Ok(AddOutcome::CartOpened)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `CartError` for an invalid product id or quantity.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) -> Result<(), CartError> {
        self.cart.update_quantity(product_id, quantity)
    }

    pub fn remove_from_cart(&mut self, product_id: ProductId) {
        self.cart.remove_from_cart(product_id);
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear_cart();
    }

    pub fn open_cart(&mut self) {
        self.open_cart.open_cart_modal(&mut self.cart);
    }

    pub const fn close_cart(&mut self) {
        self.cart.close_cart_modal();
    }

    /// Record the cart button's bounding box and register it as the anchor.
    pub fn report_anchor(&mut self, rect: Rect) {
        self.anchor.report(rect);
        let anchor: Arc<dyn CartAnchor> = self.anchor.clone();
        self.open_cart.set_cart_button_ref(Some(anchor));
    }

    /// Center of the registered cart button.
    #[must_use]
    pub fn cart_button_position(&self) -> Option<Point> {
        self.open_cart.cart_button_position()
    }

    /// The strip was rendered: restore the stored offset.
    pub fn mount_navigation(&mut self, scroll_width: i64, client_width: i64) -> NavigationScrollState {
        self.navigation.container_mut().report(0, scroll_width, client_width);
        self.navigation.mount(&self.storage)
    }

    /// The strip was scrolled or resized.
    pub fn record_scroll(
        &mut self,
        scroll_left: i64,
        scroll_width: i64,
        client_width: i64,
    ) -> NavigationScrollState {
        self.navigation
            .container_mut()
            .report(scroll_left, scroll_width, client_width);
        self.navigation.on_scroll(&mut self.storage)
    }

    /// An arrow button was clicked.
    pub fn scroll_by(&mut self, direction: ScrollDirection) -> (Option<ScrollRequest>, NavigationScrollState) {
        match direction {
            ScrollDirection::Left => self.navigation.scroll_left(),
            ScrollDirection::Right => self.navigation.scroll_right(),
        }
        let request = self.navigation.container_mut().take_request();
        (request, self.navigation.check_scroll_buttons())
    }

    /// Tear down everything with a timer.
    pub fn unmount(&self) {
        self.animations.unmount();
    }
}
