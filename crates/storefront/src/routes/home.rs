//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::layout::Layout;
use super::products::ProductView;
use crate::middleware::Shopper;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub products: Vec<ProductView>,
}

/// Display the home page: category strip and the default product page.
#[instrument(skip(state, shopper), fields(shopper_id = %shopper.id))]
pub async fn home(State(state): State<AppState>, shopper: Shopper) -> impl IntoResponse {
    let products = state
        .catalog()
        .all_products(None)
        .await
        .iter()
        .map(|product| ProductView::from(product.as_ref()))
        .collect();

    HomeTemplate {
        layout: Layout::load(&state, &shopper, None).await,
        products,
    }
}
