//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use quickcart_core::{Product, ProductId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub price: String,
    pub thumbnail: String,
    pub category: String,
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_u32(),
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            thumbnail: product.thumbnail.to_string(),
            category: product.category.clone(),
        }
    }
}

/// Product detail overlay fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_modal.html")]
pub struct ProductModalTemplate {
    pub product: ProductView,
}

/// Display the product detail overlay.
///
/// Only products from a listing fetched within the revalidation window can
/// be shown; anything else is not found.
#[instrument(skip(state))]
pub async fn modal(State(state): State<AppState>, Path(id): Path<u32>) -> Result<impl IntoResponse> {
    let product = state
        .catalog()
        .product(ProductId::new(id))
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductModalTemplate {
        product: ProductView::from(product.as_ref()),
    })
}
