//! Core types for QuickCart.
//!
//! This module provides type-safe wrappers for catalog and layout concepts.

pub mod catalog;
pub mod geometry;
pub mod id;
pub mod price;

pub use catalog::{Category, Product, ProductsPage};
pub use geometry::{Point, Rect};
pub use id::*;
pub use price::Price;
