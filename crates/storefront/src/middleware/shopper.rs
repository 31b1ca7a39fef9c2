//! Shopper extractor.
//!
//! Resolves the request's browser session to its [`ShopperSession`] state,
//! creating both on first contact.
//!
//! [`ShopperSession`]: crate::shopper::ShopperSession

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::Span;

use super::session::keys;
use crate::error::AppError;
use crate::shopper::{SharedShopper, ShopperId};
use crate::state::AppState;

/// The current shopper.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(shopper: Shopper) -> impl IntoResponse {
///     let count = shopper.lock().cart().total_items();
///     format!("{count} items")
/// }
/// ```
pub struct Shopper {
    pub id: ShopperId,
    session: SharedShopper,
}

impl Shopper {
    /// Lock the shopper's state for a synchronous mutation.
    pub fn lock(&self) -> std::sync::MutexGuard<'_, crate::shopper::ShopperSession> {
        crate::shopper::lock(&self.session)
    }
}

impl FromRequestParts<AppState> for Shopper {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let id = match session.get::<ShopperId>(keys::SHOPPER_ID).await? {
            Some(id) => id,
            None => {
                let id = ShopperId::generate();
                session.insert(keys::SHOPPER_ID, id).await?;
                id
            }
        };

        Span::current().record("shopper_id", tracing::field::display(id));

        let session = state.shoppers().get_or_create(id).await;
        Ok(Self { id, session })
    }
}
