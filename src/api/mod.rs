//! HTTP surface: public storefront routes plus the token-gated admin
//! panel under `/api/admin`.

pub mod admin;
pub mod assets;
pub mod categories;
pub mod checkout;
pub mod hero_images;
pub mod orders;
pub mod products;
pub mod qr_codes;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// A 5 MB receipt grows by a third as base64, plus the rest of the
/// payload; 10 MB leaves room without being an open door.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20).min(100)
    }

    pub fn offset(&self) -> i64 {
        // Widen before multiplying: page is clamped below but not above.
        (self.page() as i64 - 1) * self.per_page() as i64
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/products", get(products::admin_list_products).post(products::create_product))
        .route(
            "/products/:id",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/categories", post(categories::create_category))
        .route(
            "/categories/:id",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/orders", get(orders::list_orders))
        .route("/orders/:id", get(orders::get_order).delete(orders::delete_order))
        .route("/orders/:id/status", put(orders::update_order_status))
        .route("/hero-images", get(hero_images::admin_list_hero_images).post(hero_images::create_hero_image))
        .route(
            "/hero-images/:id",
            put(hero_images::update_hero_image).delete(hero_images::delete_hero_image),
        )
        .route("/qr-codes", get(qr_codes::list_qr_codes).post(qr_codes::create_qr_code))
        .route(
            "/qr-codes/:id",
            put(qr_codes::update_qr_code).delete(qr_codes::delete_qr_code),
        )
        .route("/assets", get(assets::list_assets).post(assets::upload_asset))
        .route("/assets/:id", delete(assets::delete_asset))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin::require_admin));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "dopetech-commerce"})) }))
        .route("/api/products", get(products::list_products))
        .route("/api/products/:id", get(products::get_product))
        .route("/api/categories", get(categories::list_categories))
        .route("/api/hero-images", get(hero_images::list_active_hero_images))
        .route("/api/qr-codes/active", get(qr_codes::get_active_qr_code))
        .route("/api/checkout", post(checkout::submit_order))
        .route("/api/order-emails", post(checkout::send_order_emails))
        .nest("/api/admin", admin)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_clamp() {
        let params = ListParams { page: Some(0), per_page: Some(500), category: None, status: None, search: None };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 100);
        assert_eq!(params.offset(), 0);

        let params = ListParams { page: Some(3), per_page: None, category: None, status: None, search: None };
        assert_eq!(params.per_page(), 20);
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_offset_handles_max_page() {
        let params =
            ListParams { page: Some(u32::MAX), per_page: Some(100), category: None, status: None, search: None };
        assert_eq!(params.offset(), (u32::MAX as i64 - 1) * 100);
    }
}
