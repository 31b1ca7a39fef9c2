//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (category strip + product grid)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (catalog API reachable)
//!
//! # Catalog
//! GET  /category/{slug}        - Category listing (?limit=N)
//! GET  /products/{id}/modal    - Product detail overlay fragment (HTMX)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart panel fragment
//! GET  /cart/count             - Cart count badge fragment
//! POST /cart/add               - Add to cart (returns badge, triggers feedback)
//! POST /cart/update            - Update quantity (returns panel)
//! POST /cart/remove            - Remove line (returns panel)
//! POST /cart/clear             - Empty the cart (returns panel)
//! POST /cart/open              - Open the panel
//! POST /cart/close             - Close the panel
//! POST /cart/anchor            - Report the cart button rect (JSON)
//! GET  /cart/feedback          - Live add-to-cart animations (JSON)
//!
//! # Category strip (JSON)
//! POST /nav/mount              - Restore the stored scroll offset
//! POST /nav/scroll             - Record a scroll event
//! POST /nav/scroll-by          - Arrow button scroll
//! ```

pub mod cart;
pub mod categories;
pub mod home;
pub mod layout;
pub mod navigation;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/category/{slug}", get(categories::show))
        .route("/products/{id}/modal", get(products::modal))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/open", post(cart::open))
        .route("/close", post(cart::close))
        .route("/anchor", post(cart::anchor))
        .route("/feedback", get(cart::feedback))
}

/// Create the category strip routes router.
pub fn navigation_routes() -> Router<AppState> {
    Router::new()
        .route("/mount", post(navigation::mount))
        .route("/scroll", post(navigation::scroll))
        .route("/scroll-by", post(navigation::scroll_by))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/nav", navigation_routes())
}

/// The complete application: routes, sessions, request ids and tracing.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes()
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the catalog API cannot be loaded.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.catalog().try_categories().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Json,
        body::Body,
        http::{Request, Response, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use url::Url;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::feedback::CartFeedback;

    /// Serve a two-product catalog on an ephemeral port.
    async fn spawn_catalog() -> Url {
        let product = |id: u32, price: f64| {
            json!({
                "id": id,
                "title": format!("Fixture {id}"),
                "description": "Fixture product",
                "price": price,
                "thumbnail": format!("https://cdn.dummyjson.com/{id}.png"),
                "category": "beauty"
            })
        };
        let page = json!({
            "products": [product(1, 9.99), product(2, 20.0)],
            "total": 2, "skip": 0, "limit": 2
        });
        let categories = json!([
            {"slug": "beauty", "name": "Beauty", "url": "https://dummyjson.com/products/category/beauty"}
        ]);

        let all = page.clone();
        let app = Router::new()
            .route("/products", get(move || async move { Json(all) }))
            .route("/products/category/{slug}", get(move || async move { Json(page) }))
            .route("/products/categories", get(move || async move { Json(categories) }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn config(api: Url, feedback: CartFeedback) -> StorefrontConfig {
        let mut config = StorefrontConfig::default();
        config.catalog.api_base_url = api;
        config.cart_feedback = feedback;
        config
    }

    /// A catalog address nothing listens on.
    fn offline() -> Url {
        Url::parse("http://127.0.0.1:9").unwrap()
    }

    /// Drives the app like one browser: keeps the session cookie.
    struct Browser {
        app: Router,
        cookie: Option<String>,
    }

    impl Browser {
        fn new(config: StorefrontConfig) -> Self {
            Self {
                app: app(AppState::new(config)),
                cookie: None,
            }
        }

        async fn send(&mut self, request: Request<Body>) -> Response<Body> {
            let mut request = request;
            if let Some(cookie) = &self.cookie {
                request
                    .headers_mut()
                    .insert(header::COOKIE, cookie.parse().unwrap());
            }
            let response = self.app.clone().oneshot(request).await.unwrap();
            if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
                let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
                self.cookie = Some(pair.to_string());
            }
            response
        }

        async fn get(&mut self, uri: &str) -> Response<Body> {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn form(&mut self, uri: &str, body: &str) -> Response<Body> {
            self.send(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }

        async fn json(&mut self, uri: &str, body: &Value) -> Response<Body> {
            self.send(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }
    }

    async fn text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        serde_json::from_str(&text(response).await).unwrap()
    }

    fn trigger(response: &Response<Body>) -> Option<String> {
        response
            .headers()
            .get("HX-Trigger")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_health() {
        let mut browser = Browser::new(config(offline(), CartFeedback::OpenCart));
        let response = browser.get("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_readiness_reflects_catalog() {
        let mut browser = Browser::new(config(offline(), CartFeedback::OpenCart));
        let response = browser.get("/health/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let mut browser = Browser::new(config(spawn_catalog().await, CartFeedback::OpenCart));
        let response = browser.get("/health/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_home_renders_empty_when_catalog_is_down() {
        let mut browser = Browser::new(config(offline(), CartFeedback::OpenCart));
        let response = browser.get("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains("No products found"));
    }

    #[tokio::test]
    async fn test_add_to_cart_opens_cart() {
        let mut browser = Browser::new(config(spawn_catalog().await, CartFeedback::OpenCart));
        let home = browser.get("/").await;
        assert!(text(home).await.contains("Fixture 1"));

        let response = browser.form("/cart/add", "product_id=1&x=10&y=20").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(trigger(&response).as_deref(), Some("cart-updated, cart-opened"));
        assert!(text(response).await.contains('1'));

        browser.form("/cart/add", "product_id=1").await;
        browser.form("/cart/add", "product_id=2").await;

        let count = text(browser.get("/cart/count").await).await;
        assert!(count.contains('3'));

        let panel = text(browser.get("/cart").await).await;
        assert!(panel.contains("data-open=\"true\""));
        assert!(panel.contains("$39.98"));
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_refused() {
        let mut browser = Browser::new(config(spawn_catalog().await, CartFeedback::OpenCart));
        let response = browser.form("/cart/add", "product_id=999").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(trigger(&response), None);

        let response = browser.form("/cart/add", "product_id=-4").await;
        assert_eq!(trigger(&response), None);
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let mut browser = Browser::new(config(spawn_catalog().await, CartFeedback::OpenCart));
        browser.get("/").await;
        browser.form("/cart/add", "product_id=1").await;

        let response = browser.form("/cart/update", "product_id=1&quantity=4").await;
        assert_eq!(trigger(&response).as_deref(), Some("cart-updated"));
        assert!(text(response).await.contains("$39.96"));

        let response = browser.form("/cart/update", "product_id=-1&quantity=4").await;
        assert_eq!(trigger(&response), None);

        let response = browser.form("/cart/update", "product_id=1&quantity=-5").await;
        assert_eq!(trigger(&response).as_deref(), Some("cart-updated"));
        assert!(text(response).await.contains("Your cart is empty"));

        browser.form("/cart/add", "product_id=2").await;
        browser.form("/cart/remove", "product_id=2").await;
        assert!(text(browser.get("/cart/count").await).await.contains('0'));
    }

    #[tokio::test]
    async fn test_malformed_quantity_keeps_panel() {
        let mut browser = Browser::new(config(spawn_catalog().await, CartFeedback::OpenCart));
        browser.get("/").await;
        browser.form("/cart/add", "product_id=1").await;
        browser.form("/cart/update", "product_id=1&quantity=2").await;

        for body in [
            "product_id=1&quantity=",
            "product_id=1&quantity=abc",
            "product_id=1&quantity=2.5",
            "product_id=&quantity=3",
            "quantity=3",
        ] {
            let response = browser.form("/cart/update", body).await;
            assert_eq!(response.status(), StatusCode::OK, "{body}");
            assert_eq!(trigger(&response), None, "{body}");
            assert!(text(response).await.contains("$19.98"), "{body}");
        }
    }

    #[tokio::test]
    async fn test_malformed_add_and_remove_are_refused() {
        let mut browser = Browser::new(config(spawn_catalog().await, CartFeedback::OpenCart));
        browser.get("/").await;
        browser.form("/cart/add", "product_id=1").await;

        let response = browser.form("/cart/add", "product_id=one").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(trigger(&response), None);

        let response = browser.form("/cart/remove", "product_id=1.0").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(trigger(&response), None);
        assert!(text(browser.get("/cart/count").await).await.contains('1'));

        // Unparseable click coordinates only drop the animation start.
        let response = browser.form("/cart/add", "product_id=1&x=&y=nan").await;
        assert_eq!(trigger(&response).as_deref(), Some("cart-updated, cart-opened"));
    }

    #[tokio::test]
    async fn test_open_close_idempotent() {
        let mut browser = Browser::new(config(offline(), CartFeedback::OpenCart));
        browser.form("/cart/open", "").await;
        let panel = text(browser.form("/cart/open", "").await).await;
        assert!(panel.contains("data-open=\"true\""));

        browser.form("/cart/close", "").await;
        let panel = text(browser.form("/cart/close", "").await).await;
        assert!(panel.contains("data-open=\"false\""));
    }

    #[tokio::test]
    async fn test_flying_item_feedback() {
        let mut browser = Browser::new(config(spawn_catalog().await, CartFeedback::FlyingItem));
        browser.get("/").await;

        let response = browser
            .json("/cart/anchor", &json!({"left": 900.0, "top": 10.0, "width": 40.0, "height": 40.0}))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = browser.form("/cart/add", "product_id=1&x=100&y=500").await;
        assert_eq!(trigger(&response).as_deref(), Some("cart-updated, cart-feedback"));

        let feedback = json_body(browser.get("/cart/feedback").await).await;
        assert_eq!(feedback["mechanism"], "flying-item");
        assert_eq!(feedback["cart_button"], json!({"x": 920.0, "y": 30.0}));
        assert_eq!(feedback["animations"][0]["type"], "flying_item");
        assert_eq!(feedback["animations"][0]["end"], json!({"x": 920.0, "y": 30.0}));
    }

    #[tokio::test]
    async fn test_shoppers_do_not_share_carts() {
        let api = spawn_catalog().await;
        let state = AppState::new(config(api, CartFeedback::OpenCart));
        let mut first = Browser {
            app: app(state.clone()),
            cookie: None,
        };
        let mut second = Browser {
            app: app(state),
            cookie: None,
        };

        first.get("/").await;
        first.form("/cart/add", "product_id=1").await;
        assert!(text(first.get("/cart/count").await).await.contains('1'));
        assert!(text(second.get("/cart/count").await).await.contains('0'));
    }

    #[tokio::test]
    async fn test_product_modal() {
        let mut browser = Browser::new(config(spawn_catalog().await, CartFeedback::OpenCart));
        let response = browser.get("/products/1/modal").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        browser.get("/category/beauty").await;
        let response = browser.get("/products/1/modal").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains("Fixture product"));
    }

    #[tokio::test]
    async fn test_category_listing() {
        let mut browser = Browser::new(config(spawn_catalog().await, CartFeedback::OpenCart));
        let response = browser.get("/category/beauty?limit=2").await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = text(response).await;
        assert!(page.contains("Beauty"));
        assert!(page.contains("Fixture 2"));

        let response = browser.get("/category/shoes").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_category_renders_empty_when_catalog_is_down() {
        let mut browser = Browser::new(config(offline(), CartFeedback::OpenCart));
        let response = browser.get("/category/beauty").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains("No products found"));
    }

    #[tokio::test]
    async fn test_navigation_scroll_position_round_trip() {
        let mut browser = Browser::new(config(offline(), CartFeedback::OpenCart));

        let state = json_body(
            browser
                .json("/nav/mount", &json!({"scroll_width": 1200, "client_width": 500}))
                .await,
        )
        .await;
        assert_eq!(state["scroll_offset"], 0);
        assert_eq!(state["can_scroll_left"], false);
        assert_eq!(state["can_scroll_right"], true);

        browser
            .json(
                "/nav/scroll",
                &json!({"scroll_left": 600, "scroll_width": 1200, "client_width": 500}),
            )
            .await;

        // Next page load restores the offset.
        let state = json_body(
            browser
                .json("/nav/mount", &json!({"scroll_width": 1200, "client_width": 500}))
                .await,
        )
        .await;
        assert_eq!(state["scroll_offset"], 600);
        assert_eq!(state["can_scroll_left"], true);
        assert_eq!(state["can_scroll_right"], true);

        let state = json_body(browser.json("/nav/scroll-by", &json!({"direction": "right"})).await).await;
        assert_eq!(state["scroll"], json!({"delta": 200, "behavior": "smooth"}));
        assert_eq!(state["scroll_offset"], 700);
        assert_eq!(state["can_scroll_right"], false);
    }

    #[tokio::test]
    async fn test_navigation_rejects_negative_geometry() {
        let mut browser = Browser::new(config(offline(), CartFeedback::OpenCart));
        let response = browser
            .json("/nav/mount", &json!({"scroll_width": -1, "client_width": 500}))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
