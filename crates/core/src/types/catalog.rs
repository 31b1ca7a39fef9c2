//! Catalog records as they exist after validation.
//!
//! Instances are only produced by [`crate::validation`] (or by tests) and are
//! treated as immutable: cart lines hold them behind an `Arc` instead of
//! copying them.

use std::sync::Arc;

use serde::Serialize;
use url::Url;

use super::{Price, ProductId};

/// A product from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub thumbnail: Url,
    /// Slug of the category the product belongs to.
    pub category: String,
}

/// One page of a category listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductsPage {
    pub products: Vec<Arc<Product>>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

impl ProductsPage {
    /// An empty page, used when a listing cannot be loaded.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            products: Vec::new(),
            total: 0,
            skip: 0,
            limit: 0,
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Category {
    pub name: String,
    /// URL-safe unique identifier, used in `/category/{slug}`.
    pub slug: String,
    /// Upstream API URL for the category listing.
    pub url: Url,
}
