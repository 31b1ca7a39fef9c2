//! Product catalog API client.
//!
//! # Architecture
//!
//! - Plain `reqwest` GETs against the catalog API (`https://dummyjson.com` by default)
//! - Every response body goes through the validation boundary in
//!   `quickcart_core::validation` before it reaches the rest of the app
//! - In-memory caching via `moka`; entries live for the revalidation window
//!   (one hour by default), after which the next access fetches again
//! - Failures are never cached
//!
//! # Endpoints
//!
//! ```text
//! GET {base}/products/categories             -> [{slug, name, url}]
//! GET {base}/products/category/{slug}[?limit] -> {products, total, skip, limit}
//! GET {base}/products[?limit]                 -> {products, total, skip, limit}
//! ```
//!
//! # Failure handling
//!
//! The `try_*` methods return a [`CatalogError`] that tells fetch failures
//! (HTTP status) apart from validation failures (violated fields). The plain
//! methods log the error and return an empty collection, so pages always
//! render.

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use quickcart_core::validation::{parse_categories, parse_products_page};
use quickcart_core::{Category, Product, ProductId, ProductsPage, ValidationError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::CatalogConfig;

use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The API answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Fetch { status: u16, url: String },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The body was not JSON.
    #[error("Invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The body was JSON but violated the schema.
    #[error("{source} (from {url})")]
    Validation {
        url: String,
        #[source]
        source: ValidationError,
    },

    /// The configured base URL cannot carry a path.
    #[error("Invalid catalog base URL: {0}")]
    InvalidBaseUrl(String),
}

impl CatalogError {
    /// HTTP status for fetch errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Violated fields for validation errors.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the product catalog API.
///
/// Cheaply cloneable; clones share the HTTP client and caches.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
    /// Every product seen in a validated listing, by id.
    products: Cache<ProductId, Arc<Product>>,
}

/// Upper bound on a single catalog request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.revalidate)
            .build();
        let products = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(config.revalidate)
            .build();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.api_base_url.clone(),
                cache,
                products,
            }),
        }
    }

    /// Build an endpoint URL below the base URL.
    fn endpoint(&self, segments: &[&str], limit: Option<u32>) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if let Some(limit) = limit.filter(|l| *l > 0) {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        Ok(url)
    }

    /// GET a URL and run the body through a validation function.
    async fn fetch_and_validate<T>(
        &self,
        url: Url,
        validate: fn(&Value) -> Result<T, ValidationError>,
    ) -> Result<T, CatalogError> {
        let url_str = url.to_string();

        let response = self
            .inner
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| CatalogError::Network {
                url: url_str.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Fetch {
                status: status.as_u16(),
                url: url_str,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| CatalogError::Network {
                url: url_str.clone(),
                source,
            })?;

        let value: Value = serde_json::from_str(&body).map_err(|source| CatalogError::Decode {
            url: url_str.clone(),
            source,
        })?;

        validate(&value).map_err(|source| CatalogError::Validation {
            url: url_str,
            source,
        })
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// Get all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    #[instrument(skip(self))]
    pub async fn try_categories(&self) -> Result<Arc<Vec<Category>>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint(&["products", "categories"], None)?;
        let categories = Arc::new(self.fetch_and_validate(url, parse_categories).await?);

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;

        Ok(categories)
    }

    /// Get all categories, or an empty list if they cannot be loaded.
    pub async fn categories(&self) -> Vec<Category> {
        match self.try_categories().await {
            Ok(categories) => categories.as_ref().clone(),
            Err(e) => {
                log_fallback(&e, "categories");
                Vec::new()
            }
        }
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the products of a category.
    ///
    /// `limit` of `None` or `Some(0)` asks for the API's default page.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    #[instrument(skip(self))]
    pub async fn try_products_in_category(
        &self,
        slug: &str,
        limit: Option<u32>,
    ) -> Result<Arc<ProductsPage>, CatalogError> {
        let key = CacheKey::Category {
            slug: slug.to_string(),
            limit,
        };
        let url = self.endpoint(&["products", "category", slug], limit)?;
        self.cached_page(key, url).await
    }

    /// Get the products of a category, or an empty list if they cannot be loaded.
    pub async fn products_in_category(&self, slug: &str, limit: Option<u32>) -> Vec<Arc<Product>> {
        match self.try_products_in_category(slug, limit).await {
            Ok(page) => page.products.clone(),
            Err(e) => {
                log_fallback(&e, "category products");
                Vec::new()
            }
        }
    }

    /// Get products across all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    #[instrument(skip(self))]
    pub async fn try_all_products(
        &self,
        limit: Option<u32>,
    ) -> Result<Arc<ProductsPage>, CatalogError> {
        let key = CacheKey::AllProducts { limit };
        let url = self.endpoint(&["products"], limit)?;
        self.cached_page(key, url).await
    }

    /// Get products across all categories, or an empty list if they cannot be loaded.
    pub async fn all_products(&self, limit: Option<u32>) -> Vec<Arc<Product>> {
        match self.try_all_products(limit).await {
            Ok(page) => page.products.clone(),
            Err(e) => {
                log_fallback(&e, "all products");
                Vec::new()
            }
        }
    }

    /// A product seen in any listing fetched within the revalidation window.
    ///
    /// Returns the same `Arc` the listing holds.
    pub async fn product(&self, id: ProductId) -> Option<Arc<Product>> {
        self.inner.products.get(&id).await
    }

    async fn cached_page(&self, key: CacheKey, url: Url) -> Result<Arc<ProductsPage>, CatalogError> {
        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let page = Arc::new(self.fetch_and_validate(url, parse_products_page).await?);

        for product in &page.products {
            self.inner
                .products
                .insert(product.id, Arc::clone(product))
                .await;
        }
        self.inner
            .cache
            .insert(key, CacheValue::Products(Arc::clone(&page)))
            .await;

        Ok(page)
    }
}

/// Log a catalog failure that is being degraded to an empty result.
fn log_fallback(err: &CatalogError, what: &str) {
    match err {
        CatalogError::Fetch { status, url } => {
            warn!(status, url = %url, "Catalog fetch failed for {what}, serving empty result");
        }
        CatalogError::Validation { url, source } => {
            warn!(
                url = %url,
                fields = ?source.fields(),
                error = %source,
                "Catalog response failed validation for {what}, serving empty result"
            );
        }
        _ => error!(error = %err, "Catalog request failed for {what}, serving empty result"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Json, Router, extract::Path, http::StatusCode, routing::get};
    use serde_json::json;

    use super::*;

    fn product_json(id: u32, price: f64) -> Value {
        json!({
            "id": id,
            "title": format!("Product {id}"),
            "description": "Fixture product",
            "price": price,
            "thumbnail": format!("https://cdn.dummyjson.com/{id}.png"),
            "category": "beauty"
        })
    }

    /// Serve fixture catalog responses on an ephemeral port.
    async fn spawn_catalog(hits: Arc<AtomicUsize>) -> Url {
        let categories_hits = Arc::clone(&hits);
        let app = Router::new()
            .route(
                "/products/categories",
                get(move || {
                    categories_hits.fetch_add(1, Ordering::SeqCst);
                    async {
                        Json(json!([
                            {"slug": "beauty", "name": "Beauty", "url": "https://dummyjson.com/products/category/beauty"},
                            {"slug": "mens-shirts", "name": "Mens Shirts", "url": "https://dummyjson.com/products/category/mens-shirts"}
                        ]))
                    }
                }),
            )
            .route(
                "/products/category/{slug}",
                get(|Path(slug): Path<String>| async move {
                    match slug.as_str() {
                        "beauty" => (
                            StatusCode::OK,
                            Json(json!({
                                "products": [product_json(1, 9.99), product_json(2, 19.99)],
                                "total": 2, "skip": 0, "limit": 2
                            })),
                        ),
                        "broken" => (
                            StatusCode::OK,
                            Json(json!({
                                "products": [product_json(3, -1.0)],
                                "total": 1, "skip": 0, "limit": 1
                            })),
                        ),
                        _ => (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))),
                    }
                }),
            )
            .route(
                "/products",
                get(|| async {
                    Json(json!({
                        "products": [product_json(7, 1.5)],
                        "total": 1, "skip": 0, "limit": 1
                    }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn client_for(base: Url) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            api_base_url: base,
            revalidate: Duration::from_secs(3600),
        })
    }

    #[tokio::test]
    async fn test_categories_are_validated_and_cached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client_for(spawn_catalog(Arc::clone(&hits)).await);

        let first = client.categories().await;
        let second = client.categories().await;

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(first[1].name, "Mens Shirts");
    }

    #[tokio::test]
    async fn test_products_in_category_indexes_products() {
        let client = client_for(spawn_catalog(Arc::new(AtomicUsize::new(0))).await);

        let products = client.products_in_category("beauty", None).await;
        assert_eq!(products.len(), 2);

        let indexed = client.product(ProductId::new(2)).await.unwrap();
        assert!(Arc::ptr_eq(&indexed, &products[1]));
    }

    #[tokio::test]
    async fn test_invalid_payload_is_a_validation_error() {
        let client = client_for(spawn_catalog(Arc::new(AtomicUsize::new(0))).await);

        let err = client
            .try_products_in_category("broken", None)
            .await
            .unwrap_err();
        assert!(err.validation().unwrap().has_field("products[0].price"));
        assert!(client.products_in_category("broken", None).await.is_empty());
        assert!(client.product(ProductId::new(3)).await.is_none());
    }

    #[tokio::test]
    async fn test_non_success_status_is_a_fetch_error() {
        let client = client_for(spawn_catalog(Arc::new(AtomicUsize::new(0))).await);

        let err = client
            .try_products_in_category("nope", Some(5))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(client.products_in_category("nope", Some(5)).await.is_empty());
    }

    #[tokio::test]
    async fn test_all_products() {
        let client = client_for(spawn_catalog(Arc::new(AtomicUsize::new(0))).await);
        let products = client.all_products(Some(30)).await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, ProductId::new(7));
    }

    #[tokio::test]
    async fn test_unreachable_api_degrades_to_empty() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let client = client_for(Url::parse("http://127.0.0.1:9").unwrap());
        assert!(client.categories().await.is_empty());
    }

    #[test]
    fn test_endpoint_encodes_slug_and_limit() {
        let client = client_for(Url::parse("https://dummyjson.com").unwrap());
        let url = client
            .endpoint(&["products", "category", "home decoration"], Some(4))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://dummyjson.com/products/category/home%20decoration?limit=4"
        );

        let url = client.endpoint(&["products"], Some(0)).unwrap();
        assert_eq!(url.as_str(), "https://dummyjson.com/products");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client_for(Url::parse("https://example.com/api/").unwrap());
        let url = client.endpoint(&["products", "categories"], None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/products/categories");
    }
}
