//! Session cart store.
//!
//! The [`CartStore`] is the single source of truth for a shopper's cart lines
//! and for whether the cart panel is open. Every consumer (product listing,
//! product modal, cart badge, cart panel) mutates and reads the same store.
//!
//! Mutations are atomic per call: input that fails validation is logged and
//! refused, leaving the previous state untouched.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::types::{Price, Product, ProductId};
use crate::validation::{
    QuantityChange, ValidationError, validate_add_to_cart, validate_update_quantity,
};

/// Errors returned by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The mutation payload was malformed; the cart was not changed.
    #[error("Invalid cart input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The cart total would exceed the largest representable price.
    #[error("Cart total would overflow")]
    TotalOverflow,
}

/// A cart line: one product and how many of it.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    /// Shared with the catalog cache, never copied.
    pub product: Arc<Product>,
    /// Always at least 1; a line that would drop to zero is removed.
    pub quantity: u32,
}

impl CartItem {
    /// Price of this line (`price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price * self.quantity
    }
}

/// Cart lines and cart-panel visibility for one shopper.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    items: Vec<CartItem>,
    is_modal_open: bool,
}

impl CartStore {
    /// Create an empty, closed cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`.
    ///
    /// An existing line for the same product id is incremented by exactly one;
    /// otherwise a new line with quantity 1 is appended.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` if the product fails validation, or
    /// `CartError::TotalOverflow` if the cart total would no longer fit. The
    /// cart is unchanged in either case.
    pub fn add_to_cart(&mut self, product: Arc<Product>) -> Result<(), CartError> {
        let input = validate_add_to_cart(product, None).map_err(|e| {
            warn!(error = %e, "Refusing add to cart");
            CartError::from(e)
        })?;

        let product_id = input.product.id;
        let quantity = self
            .line(product_id)
            .map_or(1, |item| item.quantity.saturating_add(1));
        self.check_total(&input.product, quantity)?;

        if let Some(item) = self.line_mut(product_id) {
            item.quantity = item.quantity.saturating_add(1);
            debug!(%product_id, quantity = item.quantity, "Incremented cart line");
        } else {
            self.items.push(CartItem {
                product: input.product,
                quantity: 1,
            });
            debug!(%product_id, "Added cart line");
        }
        Ok(())
    }

    /// Remove the line for `product_id`. Absent ids are ignored.
    pub fn remove_from_cart(&mut self, product_id: ProductId) {
        let before = self.items.len();
        self.items.retain(|item| item.product.id != product_id);
        if self.items.len() != before {
            debug!(%product_id, "Removed cart line");
        }
    }

    /// Set the quantity of a line to exactly `quantity`.
    ///
    /// A quantity of zero or below removes the line. Unknown product ids are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` if the product id is not a valid id
    /// or the quantity is out of range, and `CartError::TotalOverflow` if the
    /// new line would push the total past the largest price. The cart is
    /// unchanged in either case.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) -> Result<(), CartError> {
        let input = validate_update_quantity(product_id, quantity).map_err(|e| {
            warn!(error = %e, "Refusing quantity update");
            CartError::from(e)
        })?;

        match input.change {
            QuantityChange::Remove => self.remove_from_cart(input.product_id),
            QuantityChange::Set(quantity) => {
                let Some(product) = self.line(input.product_id).map(|item| Arc::clone(&item.product))
                else {
                    return Ok(());
                };
                self.check_total(&product, quantity.get())?;
                if let Some(item) = self.line_mut(input.product_id) {
                    item.quantity = quantity.get();
                }
            }
        }
        Ok(())
    }

    /// Remove every line.
    pub fn clear_cart(&mut self) {
        self.items.clear();
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `price × quantity` across all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Open the cart panel. Opening an open cart is a no-op.
    pub const fn open_cart_modal(&mut self) {
        self.is_modal_open = true;
    }

    /// Close the cart panel. Closing a closed cart is a no-op.
    pub const fn close_cart_modal(&mut self) {
        self.is_modal_open = false;
    }

    #[must_use]
    pub const fn is_modal_open(&self) -> bool {
        self.is_modal_open
    }

    /// Cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line for `product_id`, if any.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }

    /// Refuse a line quantity whose cart total would not fit in a [`Price`].
    fn check_total(&self, product: &Product, quantity: u32) -> Result<(), CartError> {
        let others = self
            .items
            .iter()
            .filter(|item| item.product.id != product.id)
            .map(|item| (item.product.price, item.quantity));
        let fits = std::iter::once((product.price, quantity))
            .chain(others)
            .try_fold(Price::ZERO, |total, (price, quantity)| {
                total.checked_add(price.checked_mul(quantity)?)
            })
            .is_some();

        if fits {
            Ok(())
        } else {
            warn!(product_id = %product.id, quantity, "Refusing cart change, total would overflow");
            Err(CartError::TotalOverflow)
        }
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| item.product.id == product_id)
    }

    /// A serializable view of the cart for rendering.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self
                .items
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product.id,
                    title: item.product.title.clone(),
                    thumbnail: item.product.thumbnail.clone(),
                    unit_price: item.product.price,
                    quantity: item.quantity,
                    line_total: item.line_total(),
                })
                .collect(),
            total_items: self.total_items(),
            total_price: self.total_price(),
            is_modal_open: self.is_modal_open,
        }
    }
}

/// Render-ready copy of a cart line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub title: String,
    pub thumbnail: Url,
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Price,
}

/// Render-ready copy of the whole cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLineView>,
    pub total_items: u64,
    pub total_price: Price,
    pub is_modal_open: bool,
}
