//! Validation boundary for untrusted catalog payloads and cart input.
//!
//! Every payload coming from the catalog API is checked field by field before
//! it becomes a [`Product`] or [`Category`]. Checking does not stop at the
//! first problem: a [`ValidationError`] carries every violated field so the
//! log line explains the whole payload.
//!
//! # Contract
//!
//! - Product: `id` non-negative integer, `title`, `description` and `category`
//!   non-empty strings, `price` a finite number greater than zero, `thumbnail`
//!   an absolute `http(s)` URL.
//! - Category: `name` and `slug` strings (`slug` non-empty), `url` an absolute
//!   `http(s)` URL.
//! - Products page: `products` array of products, `total`, `skip` and `limit`
//!   non-negative integers.

use std::num::NonZeroU32;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::types::{Category, Price, Product, ProductId, ProductsPage};

/// A single violated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dotted path to the field, e.g. `products[2].price`.
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A payload that does not satisfy its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed for {context}: {}", format_violations(.violations))]
pub struct ValidationError {
    /// What was being validated (e.g. `product`, `categories response`).
    pub context: String,
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Paths of all violated fields.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.path.as_str()).collect()
    }

    /// Whether a given field path was violated.
    #[must_use]
    pub fn has_field(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    if violations.is_empty() {
        return "(no violations recorded)".to_string();
    }
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Field checker
// =============================================================================

/// Collects violations while reading fields from a JSON object.
#[derive(Default)]
struct Checker {
    violations: Vec<FieldViolation>,
}

impl Checker {
    fn violation(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            path: path.into(),
            message: message.into(),
        });
    }

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.violation(display_path(path), "expected an object");
        }
        object
    }

    fn field<'a>(
        &mut self,
        object: &'a Map<String, Value>,
        prefix: &str,
        name: &str,
    ) -> Option<&'a Value> {
        let value = object.get(name).filter(|v| !v.is_null());
        if value.is_none() {
            self.violation(join(prefix, name), "required");
        }
        value
    }

    fn string(
        &mut self,
        object: &Map<String, Value>,
        prefix: &str,
        name: &str,
        non_empty: bool,
    ) -> Option<String> {
        let value = self.field(object, prefix, name)?;
        let Some(s) = value.as_str() else {
            self.violation(join(prefix, name), "expected a string");
            return None;
        };
        if non_empty && s.trim().is_empty() {
            self.violation(join(prefix, name), "must not be empty");
            return None;
        }
        Some(s.to_string())
    }

    fn count(&mut self, object: &Map<String, Value>, prefix: &str, name: &str) -> Option<u64> {
        let value = self.field(object, prefix, name)?;
        let count = value.as_u64();
        if count.is_none() {
            self.violation(join(prefix, name), "expected a non-negative integer");
        }
        count
    }

    fn product_id(
        &mut self,
        object: &Map<String, Value>,
        prefix: &str,
        name: &str,
    ) -> Option<ProductId> {
        let value = self.field(object, prefix, name)?;
        let id = value
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
            .map(ProductId::new);
        if id.is_none() {
            self.violation(join(prefix, name), "expected a non-negative integer id");
        }
        id
    }

    fn price(&mut self, object: &Map<String, Value>, prefix: &str, name: &str) -> Option<Price> {
        let value = self.field(object, prefix, name)?;
        let Some(amount) = value.as_f64() else {
            self.violation(join(prefix, name), "expected a number");
            return None;
        };
        match Price::from_f64(amount) {
            Some(price) if price.is_positive() => Some(price),
            _ => {
                self.violation(join(prefix, name), "must be greater than 0");
                None
            }
        }
    }

    fn url(&mut self, object: &Map<String, Value>, prefix: &str, name: &str) -> Option<Url> {
        let raw = self.string(object, prefix, name, false)?;
        match parse_web_url(&raw) {
            Ok(url) => Some(url),
            Err(message) => {
                self.violation(join(prefix, name), message);
                None
            }
        }
    }

    fn finish<T>(self, context: &str, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(value) if self.violations.is_empty() => Ok(value),
            _ => Err(ValidationError {
                context: context.to_string(),
                violations: self.violations,
            }),
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

fn parse_web_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL: {e}"))?;
    if matches!(url.scheme(), "http" | "https") {
        Ok(url)
    } else {
        Err(format!("unsupported URL scheme '{}'", url.scheme()))
    }
}

// =============================================================================
// Catalog payloads
// =============================================================================

fn read_product(checker: &mut Checker, value: &Value, prefix: &str) -> Option<Product> {
    let object = checker.object(value, prefix)?;

    let id = checker.product_id(object, prefix, "id");
    let title = checker.string(object, prefix, "title", true);
    let description = checker.string(object, prefix, "description", true);
    let price = checker.price(object, prefix, "price");
    let thumbnail = checker.url(object, prefix, "thumbnail");
    let category = checker.string(object, prefix, "category", true);

    Some(Product {
        id: id?,
        title: title?,
        description: description?,
        price: price?,
        thumbnail: thumbnail?,
        category: category?,
    })
}

fn read_category(checker: &mut Checker, value: &Value, prefix: &str) -> Option<Category> {
    let object = checker.object(value, prefix)?;

    let name = checker.string(object, prefix, "name", false);
    let slug = checker.string(object, prefix, "slug", true);
    let url = checker.url(object, prefix, "url");

    Some(Category {
        name: name?,
        slug: slug?,
        url: url?,
    })
}

/// Validate a single product object.
///
/// # Errors
///
/// Returns a `ValidationError` listing every violated field.
pub fn parse_product(value: &Value) -> Result<Product, ValidationError> {
    let mut checker = Checker::default();
    let product = read_product(&mut checker, value, "");
    checker.finish("product", product)
}

/// Validate a category listing response (`{products, total, skip, limit}`).
///
/// A single malformed product rejects the whole page.
///
/// # Errors
///
/// Returns a `ValidationError` listing every violated field.
pub fn parse_products_page(value: &Value) -> Result<ProductsPage, ValidationError> {
    let mut checker = Checker::default();

    let page = checker.object(value, "").and_then(|object| {
        let products = match checker.field(object, "", "products") {
            Some(Value::Array(items)) => {
                let parsed: Vec<Option<Product>> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| read_product(&mut checker, item, &format!("products[{i}]")))
                    .collect();
                parsed
                    .into_iter()
                    .collect::<Option<Vec<_>>>()
                    .map(|products| products.into_iter().map(Arc::new).collect::<Vec<_>>())
            }
            Some(_) => {
                checker.violation("products", "expected an array");
                None
            }
            None => None,
        };
        let total = checker.count(object, "", "total");
        let skip = checker.count(object, "", "skip");
        let limit = checker.count(object, "", "limit");

        Some(ProductsPage {
            products: products?,
            total: total?,
            skip: skip?,
            limit: limit?,
        })
    });

    checker.finish("products response", page)
}

/// Validate the categories response (a JSON array of categories).
///
/// # Errors
///
/// Returns a `ValidationError` listing every violated field.
pub fn parse_categories(value: &Value) -> Result<Vec<Category>, ValidationError> {
    let mut checker = Checker::default();

    let categories = match value.as_array() {
        Some(items) => {
            let parsed: Vec<Option<Category>> = items
                .iter()
                .enumerate()
                .map(|(i, item)| read_category(&mut checker, item, &format!("[{i}]")))
                .collect();
            parsed.into_iter().collect::<Option<Vec<_>>>()
        }
        None => {
            checker.violation("(root)", "expected an array");
            None
        }
    };

    checker.finish("categories response", categories)
}

fn check_product(checker: &mut Checker, product: &Product, prefix: &str) {
    for (name, value) in [
        ("title", &product.title),
        ("description", &product.description),
        ("category", &product.category),
    ] {
        if value.trim().is_empty() {
            checker.violation(join(prefix, name), "must not be empty");
        }
    }
    if !product.price.is_positive() {
        checker.violation(join(prefix, "price"), "must be greater than 0");
    }
    if !matches!(product.thumbnail.scheme(), "http" | "https") {
        checker.violation(
            join(prefix, "thumbnail"),
            format!("unsupported URL scheme '{}'", product.thumbnail.scheme()),
        );
    }
}

// =============================================================================
// Cart input
// =============================================================================

/// A validated add-to-cart request.
#[derive(Debug, Clone)]
pub struct AddToCart {
    pub product: Arc<Product>,
    /// Requested quantity; defaults to 1.
    pub quantity: NonZeroU32,
}

/// Validate an add-to-cart request.
///
/// `quantity` defaults to 1 when absent and must be a positive integer.
///
/// # Errors
///
/// Returns a `ValidationError` listing every violated field.
pub fn validate_add_to_cart(
    product: Arc<Product>,
    quantity: Option<i64>,
) -> Result<AddToCart, ValidationError> {
    let mut checker = Checker::default();
    check_product(&mut checker, &product, "product");

    let quantity = match quantity {
        None => Some(NonZeroU32::MIN),
        Some(q) => {
            let parsed = u32::try_from(q).ok().and_then(NonZeroU32::new);
            if parsed.is_none() {
                checker.violation("quantity", "must be a positive integer");
            }
            parsed
        }
    };

    let input = quantity.map(|quantity| AddToCart { product, quantity });
    checker.finish("add to cart", input)
}

/// What an update-quantity request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Quantity zero or below: drop the line.
    Remove,
    /// Set the line to exactly this quantity.
    Set(NonZeroU32),
}

/// A validated update-quantity request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateQuantity {
    pub product_id: ProductId,
    pub change: QuantityChange,
}

/// Validate an update-quantity request.
///
/// Any quantity at or below zero is a removal request; quantities that do
/// not fit a line quantity are rejected.
///
/// # Errors
///
/// Returns a `ValidationError` listing every violated field.
pub fn validate_update_quantity(
    product_id: i64,
    quantity: i64,
) -> Result<UpdateQuantity, ValidationError> {
    let mut checker = Checker::default();

    let id = ProductId::try_from(product_id).ok();
    if id.is_none() {
        checker.violation("productId", "expected a non-negative integer id");
    }

    let change = if quantity <= 0 {
        Some(QuantityChange::Remove)
    } else {
        let parsed = u32::try_from(quantity).ok().and_then(NonZeroU32::new);
        if parsed.is_none() {
            checker.violation("quantity", "out of range");
        }
        parsed.map(QuantityChange::Set)
    };

    let input = id
        .zip(change)
        .map(|(product_id, change)| UpdateQuantity { product_id, change });
    checker.finish("update quantity", input)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product_json() -> Value {
        json!({
            "id": 1,
            "title": "Essence Mascara Lash Princess",
            "description": "A popular mascara.",
            "price": 9.99,
            "thumbnail": "https://cdn.dummyjson.com/products/images/beauty/1/thumbnail.png",
            "category": "beauty",
            "rating": 4.94
        })
    }

    #[test]
    fn test_parse_product_valid() {
        let product = parse_product(&product_json()).unwrap();
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.category, "beauty");
        assert_eq!(product.price.display(), "$9.99");
    }

    #[test]
    fn test_parse_product_negative_price() {
        let mut value = product_json();
        value["price"] = json!(-4.5);
        let err = parse_product(&value).unwrap_err();
        assert!(err.has_field("price"));
    }

    #[test]
    fn test_parse_product_zero_price() {
        let mut value = product_json();
        value["price"] = json!(0);
        assert!(parse_product(&value).unwrap_err().has_field("price"));
    }

    #[test]
    fn test_parse_product_bad_thumbnail() {
        let mut value = product_json();
        value["thumbnail"] = json!("not a url");
        let err = parse_product(&value).unwrap_err();
        assert_eq!(err.fields(), vec!["thumbnail"]);
    }

    #[test]
    fn test_parse_product_collects_all_violations() {
        let value = json!({
            "id": -1,
            "title": "",
            "price": "cheap",
            "thumbnail": "ftp://example.com/a.png",
            "category": "beauty"
        });
        let err = parse_product(&value).unwrap_err();
        assert!(err.has_field("id"));
        assert!(err.has_field("title"));
        assert!(err.has_field("description"));
        assert!(err.has_field("price"));
        assert!(err.has_field("thumbnail"));
        assert!(!err.has_field("category"));
    }

    #[test]
    fn test_parse_product_rejects_fractional_id() {
        let mut value = product_json();
        value["id"] = json!(1.5);
        assert!(parse_product(&value).unwrap_err().has_field("id"));
    }

    #[test]
    fn test_parse_products_page_valid() {
        let value = json!({
            "products": [product_json()],
            "total": 5,
            "skip": 0,
            "limit": 1
        });
        let page = parse_products_page(&value).unwrap();
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.total, 5);
    }

    #[test]
    fn test_parse_products_page_rejects_whole_page() {
        let mut bad = product_json();
        bad["price"] = json!(-1);
        let value = json!({
            "products": [product_json(), bad],
            "total": 2,
            "skip": 0,
            "limit": 2
        });
        let err = parse_products_page(&value).unwrap_err();
        assert_eq!(err.context, "products response");
        assert!(err.has_field("products[1].price"));
    }

    #[test]
    fn test_parse_products_page_missing_envelope() {
        let err = parse_products_page(&json!({"products": []})).unwrap_err();
        assert!(err.has_field("total"));
        assert!(err.has_field("skip"));
        assert!(err.has_field("limit"));
    }

    #[test]
    fn test_parse_categories() {
        let value = json!([
            {"slug": "beauty", "name": "Beauty", "url": "https://dummyjson.com/products/category/beauty"},
            {"slug": "fragrances", "name": "Fragrances", "url": "https://dummyjson.com/products/category/fragrances"}
        ]);
        let categories = parse_categories(&value).unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].slug, "fragrances");
    }

    #[test]
    fn test_parse_categories_rejects_bad_url() {
        let value = json!([{"slug": "beauty", "name": "Beauty", "url": "beauty"}]);
        let err = parse_categories(&value).unwrap_err();
        assert!(err.has_field("[0].url"));
    }

    #[test]
    fn test_parse_categories_rejects_object() {
        assert!(parse_categories(&json!({"slug": "beauty"})).is_err());
    }

    #[test]
    fn test_validation_error_display() {
        let mut value = product_json();
        value["price"] = json!(-1);
        let err = parse_product(&value).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed for product: price: must be greater than 0"
        );
    }

    #[test]
    fn test_validate_add_to_cart_defaults_quantity() {
        let product = Arc::new(parse_product(&product_json()).unwrap());
        let input = validate_add_to_cart(product, None).unwrap();
        assert_eq!(input.quantity.get(), 1);
    }

    #[test]
    fn test_validate_add_to_cart_rejects_zero_quantity() {
        let product = Arc::new(parse_product(&product_json()).unwrap());
        let err = validate_add_to_cart(product, Some(0)).unwrap_err();
        assert!(err.has_field("quantity"));
    }

    #[test]
    fn test_validate_update_quantity() {
        assert_eq!(
            validate_update_quantity(3, 4).unwrap().change,
            QuantityChange::Set(NonZeroU32::new(4).unwrap())
        );
        assert_eq!(
            validate_update_quantity(3, 0).unwrap().change,
            QuantityChange::Remove
        );
        assert_eq!(
            validate_update_quantity(3, -5).unwrap().change,
            QuantityChange::Remove
        );
        assert!(validate_update_quantity(-3, 1).unwrap_err().has_field("productId"));
        assert!(
            validate_update_quantity(3, i64::from(u32::MAX) + 1)
                .unwrap_err()
                .has_field("quantity")
        );
    }
}
