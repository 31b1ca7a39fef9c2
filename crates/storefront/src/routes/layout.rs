//! Data shared by every full page: category strip and cart badge.

use quickcart_core::Category;

use crate::middleware::Shopper;
use crate::state::AppState;

/// Category link display data for templates.
#[derive(Clone)]
pub struct CategoryView {
    pub name: String,
    pub slug: String,
    pub href: String,
    pub is_active: bool,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            href: format!("/category/{}", category.slug),
            is_active: false,
        }
    }
}

/// Page chrome.
#[derive(Clone)]
pub struct Layout {
    pub categories: Vec<CategoryView>,
    pub cart_count: u64,
    pub feedback: &'static str,
}

impl Layout {
    /// Load the category strip and the shopper's cart.
    pub async fn load(state: &AppState, shopper: &Shopper, active_slug: Option<&str>) -> Self {
        let categories = state
            .catalog()
            .categories()
            .await
            .iter()
            .map(|category| CategoryView {
                is_active: active_slug == Some(category.slug.as_str()),
                ..CategoryView::from(category)
            })
            .collect();
        let cart_count = shopper.lock().cart().total_items();

        Self {
            categories,
            cart_count,
            feedback: state.config().cart_feedback.as_str(),
        }
    }
}
