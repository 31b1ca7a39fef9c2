//! QuickCart Core - catalog types and storefront state machines.
//!
//! This crate provides the pieces shared by every QuickCart surface:
//! - the catalog records (`Product`, `Category`) and their validation boundary
//! - the session cart store and the open-cart coordinator
//! - the scroll state of the horizontal category strip
//!
//! # Architecture
//!
//! The core crate contains only types, traits and synchronous state machines -
//! no I/O, no HTTP clients, no timers. Geometry and storage reach the state
//! machines through the [`CartAnchor`], [`ScrollContainer`] and
//! [`SessionStorage`] traits, so the same logic runs against a browser bridge
//! or a test double.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, geometry and catalog records
//! - [`validation`] - Field-level validation of untrusted catalog payloads
//! - [`cart`] - Cart line items, totals and cart-panel visibility
//! - [`open_cart`] - Cart-button anchor tracking and cart-panel opening
//! - [`navigation`] - Category strip scroll affordances and persistence

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod navigation;
pub mod open_cart;
pub mod types;
pub mod validation;

pub use cart::{CartError, CartItem, CartLineView, CartSnapshot, CartStore};
pub use navigation::{
    MemorySessionStorage, NavigationScrollState, SCROLL_POSITION_KEY, SCROLL_STEP_PX,
    ScrollBehavior, ScrollContainer, ScrollableNavigation, SessionStorage,
};
pub use open_cart::{CartAnchor, OpenCartCoordinator};
pub use types::*;
pub use validation::{FieldViolation, ValidationError};
