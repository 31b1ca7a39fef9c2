//! Category strip scroll handlers (JSON).
//!
//! The browser reports the strip's geometry; responses carry the arrow-button
//! affordances and, where needed, a scroll for the browser to perform.

use axum::{Json, http::StatusCode};
use quickcart_core::NavigationScrollState;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::middleware::Shopper;
use crate::shopper::{ScrollDirection, ScrollRequest};

/// Strip geometry on first render.
#[derive(Debug, Deserialize)]
pub struct MountRequest {
    pub scroll_width: i64,
    pub client_width: i64,
}

/// Strip geometry after a scroll or resize.
#[derive(Debug, Deserialize)]
pub struct ScrollReport {
    pub scroll_left: i64,
    pub scroll_width: i64,
    pub client_width: i64,
}

/// Arrow button click.
#[derive(Debug, Deserialize)]
pub struct ScrollByRequest {
    pub direction: ScrollDirection,
}

/// Affordances plus an optional scroll to perform.
#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    #[serde(flatten)]
    pub state: NavigationScrollState,
    pub scroll: Option<ScrollRequest>,
}

fn check_geometry(scroll_width: i64, client_width: i64) -> Result<(), StatusCode> {
    if scroll_width < 0 || client_width < 0 {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    Ok(())
}

/// The strip was rendered. The response's `scroll_offset` is the restored
/// position to jump to.
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn mount(
    shopper: Shopper,
    Json(request): Json<MountRequest>,
) -> Result<Json<NavigationResponse>, StatusCode> {
    check_geometry(request.scroll_width, request.client_width)?;
    let state = shopper
        .lock()
        .mount_navigation(request.scroll_width, request.client_width);
    Ok(Json(NavigationResponse { state, scroll: None }))
}

/// The strip was scrolled or resized.
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn scroll(
    shopper: Shopper,
    Json(report): Json<ScrollReport>,
) -> Result<Json<NavigationResponse>, StatusCode> {
    check_geometry(report.scroll_width, report.client_width)?;
    let state = shopper
        .lock()
        .record_scroll(report.scroll_left, report.scroll_width, report.client_width);
    Ok(Json(NavigationResponse { state, scroll: None }))
}

/// An arrow button was clicked.
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn scroll_by(shopper: Shopper, Json(request): Json<ScrollByRequest>) -> Json<NavigationResponse> {
    let (scroll, state) = shopper.lock().scroll_by(request.direction);
    Json(NavigationResponse { state, scroll })
}
