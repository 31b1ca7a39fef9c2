//! Cache types for catalog API responses.

use std::sync::Arc;

use quickcart_core::{Category, ProductsPage};

/// Cache key for catalog listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Category { slug: String, limit: Option<u32> },
    AllProducts { limit: Option<u32> },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Products(Arc<ProductsPage>),
}
