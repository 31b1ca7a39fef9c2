//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::layout::Layout;
use super::products::ProductView;
use crate::error::{AppError, Result};
use crate::middleware::Shopper;
use crate::state::AppState;

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub limit: Option<u32>,
}

/// Category listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub layout: Layout,
    pub title: String,
    pub products: Vec<ProductView>,
}

/// Display the products of one category.
///
/// A slug missing from the category list is a 404. If the category list
/// itself cannot be loaded the listing still renders, empty when the
/// products are unavailable too.
#[instrument(skip(state, shopper), fields(shopper_id = %shopper.id))]
pub async fn show(
    State(state): State<AppState>,
    shopper: Shopper,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let catalog = state.catalog();
    let title = match catalog.try_categories().await {
        Ok(categories) => categories
            .iter()
            .find(|category| category.slug == slug)
            .map(|category| category.name.clone())
            .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?,
        Err(e) => {
            warn!(error = %e, "Category list unavailable, rendering listing anyway");
            slug.clone()
        }
    };

    let products = catalog
        .products_in_category(&slug, query.limit)
        .await
        .iter()
        .map(|product| ProductView::from(product.as_ref()))
        .collect();

    Ok(CategoryTemplate {
        layout: Layout::load(&state, &shopper, Some(&slug)).await,
        title,
        products,
    })
}
