//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the shopper session; every mutation holds the
//! session lock only for the synchronous update.
//!
//! Invalid input never fails the request: the mutation is refused (and
//! logged) and the unchanged cart is rendered without a `cart-updated`
//! trigger. Form fields arrive as raw strings so that a cleared or
//! fractional quantity input reaches that path instead of an extractor
//! rejection.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Response},
};
use quickcart_core::{CartSnapshot, Point, ProductId, Rect};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::add_breadcrumb;
use crate::feedback::{AnimationSnapshot, CartFeedback};
use crate::middleware::Shopper;
use crate::shopper::AddOutcome;
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: u32,
    pub title: String,
    pub thumbnail: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
    pub is_open: bool,
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&CartSnapshot> for CartView {
    fn from(cart: &CartSnapshot) -> Self {
        Self {
            items: cart
                .lines
                .iter()
                .map(|line| CartItemView {
                    product_id: line.product_id.as_u32(),
                    title: line.title.clone(),
                    thumbnail: line.thumbnail.to_string(),
                    quantity: line.quantity,
                    price: line.unit_price.display(),
                    line_price: line.line_total.display(),
                })
                .collect(),
            subtotal: cart.total_price.display(),
            item_count: cart.total_items,
            is_open: cart.is_modal_open,
        }
    }
}

/// Add to cart form data.
///
/// `x`/`y` are the viewport coordinates of the click, used as the start of
/// the add-to-cart animation.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    #[serde(default)]
    pub product_id: String,
    pub x: Option<String>,
    pub y: Option<String>,
}

impl AddToCartForm {
    fn click(&self) -> Option<Point> {
        let coordinate = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        Some(Point::new(coordinate(&self.x)?, coordinate(&self.y)?))
    }
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    #[serde(default)]
    pub product_id: String,
}

/// Parse an integer form field, logging what was refused.
fn parse_integer(field: &'static str, raw: &str) -> Option<i64> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(field, value = raw, "Refusing cart form with a non-integer field");
            None
        }
    }
}

/// Cart panel fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_panel.html")]
pub struct CartPanelTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Active feedback for the client-side animation layer.
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub mechanism: CartFeedback,
    pub cart_button: Option<Point>,
    pub animations: Vec<AnimationSnapshot>,
}

fn panel(shopper: &Shopper) -> CartPanelTemplate {
    CartPanelTemplate {
        cart: CartView::from(&shopper.lock().cart().snapshot()),
    }
}

/// Panel response after a mutation; only successful ones trigger `cart-updated`.
fn mutated_panel(shopper: &Shopper, changed: bool) -> Response {
    let panel = panel(shopper);
    if changed {
        (AppendHeaders([("HX-Trigger", "cart-updated")]), panel).into_response()
    } else {
        panel.into_response()
    }
}

/// Display the cart panel (HTMX).
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn show(shopper: Shopper) -> impl IntoResponse {
    panel(&shopper)
}

/// Get cart count badge (HTMX).
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn count(shopper: Shopper) -> impl IntoResponse {
    let count = shopper.lock().cart().total_items();
    CartCountTemplate { count }
}

/// Add one unit of a product to the cart (HTMX).
///
/// Returns the cart count badge. On success the `HX-Trigger` header carries
/// `cart-updated` plus either `cart-opened` or `cart-feedback`, telling the
/// page which feedback to render.
#[instrument(skip(state, shopper), fields(shopper_id = %shopper.id))]
pub async fn add(
    State(state): State<AppState>,
    shopper: Shopper,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product = match parse_integer("product_id", &form.product_id).map(ProductId::try_from) {
        Some(Ok(id)) => state.catalog().product(id).await,
        _ => None,
    };

    let Some(product) = product else {
        warn!(product_id = %form.product_id, "Add to cart for unknown product");
        let count = shopper.lock().cart().total_items();
        return CartCountTemplate { count }.into_response();
    };

    let product_id = product.id.to_string();
    let (result, count) = {
        let mut session = shopper.lock();
        let result = session.add_to_cart(product, form.click(), state.config().cart_feedback);
        (result, session.cart().total_items())
    };

    let trigger = match result {
        Ok(AddOutcome::CartOpened) => "cart-updated, cart-opened",
        Ok(AddOutcome::Animated(_)) => "cart-updated, cart-feedback",
        Err(_) => return CartCountTemplate { count }.into_response(),
    };

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));

    (
        AppendHeaders([("HX-Trigger", trigger)]),
        CartCountTemplate { count },
    )
        .into_response()
}

/// Update cart item quantity (HTMX).
///
/// A quantity of zero or below removes the line.
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn update(shopper: Shopper, Form(form): Form<UpdateCartForm>) -> Response {
    let parsed = parse_integer("product_id", &form.product_id)
        .zip(parse_integer("quantity", &form.quantity));
    let changed = parsed.is_some_and(|(product_id, quantity)| {
        shopper.lock().update_quantity(product_id, quantity).is_ok()
    });
    mutated_panel(&shopper, changed)
}

/// Remove item from cart (HTMX).
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn remove(shopper: Shopper, Form(form): Form<RemoveFromCartForm>) -> Response {
    let id = parse_integer("product_id", &form.product_id).map(ProductId::try_from);
    let changed = match id {
        Some(Ok(id)) => {
            shopper.lock().remove_from_cart(id);
            true
        }
        Some(Err(_)) => {
            warn!(product_id = %form.product_id, "Refusing remove with invalid product id");
            false
        }
        None => false,
    };
    mutated_panel(&shopper, changed)
}

/// Empty the cart (HTMX).
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn clear(shopper: Shopper) -> Response {
    shopper.lock().clear_cart();
    mutated_panel(&shopper, true)
}

/// Open the cart panel (HTMX).
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn open(shopper: Shopper) -> impl IntoResponse {
    shopper.lock().open_cart();
    panel(&shopper)
}

/// Close the cart panel (HTMX): close button, outside click or Escape.
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn close(shopper: Shopper) -> impl IntoResponse {
    shopper.lock().close_cart();
    panel(&shopper)
}

/// Record the cart button's bounding box.
#[instrument(skip(shopper), fields(shopper_id = %shopper.id))]
pub async fn anchor(shopper: Shopper, Json(rect): Json<Rect>) -> StatusCode {
    let valid = [rect.left, rect.top, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite());
    if !valid || rect.width < 0.0 || rect.height < 0.0 {
        warn!(?rect, "Ignoring invalid cart button rect");
        return StatusCode::UNPROCESSABLE_ENTITY;
    }

    shopper.lock().report_anchor(rect);
    StatusCode::NO_CONTENT
}

/// Live add-to-cart animations (JSON).
#[instrument(skip(state, shopper), fields(shopper_id = %shopper.id))]
pub async fn feedback(State(state): State<AppState>, shopper: Shopper) -> Json<FeedbackResponse> {
    let session = shopper.lock();
    Json(FeedbackResponse {
        mechanism: state.config().cart_feedback,
        cart_button: session.cart_button_position(),
        animations: session.animations().active(),
    })
}
