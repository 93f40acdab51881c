//! Product catalog: public browse endpoints and the admin CRUD.
//!
//! The public list races the database against a configurable timeout and
//! serves a built-in sample catalog when the query loses or fails, so
//! the storefront keeps rendering through a database outage.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::api::ListParams;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid, pub name: String, pub description: Option<String>,
    pub price: Decimal, pub original_price: Option<Decimal>,
    pub image_url: Option<String>, pub category: String,
    pub colors: Vec<String>, pub features: Vec<String>,
    pub in_stock: bool, pub hidden_on_home: bool, pub display_order: i32,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

/// `category=all` is the storefront's "no filter" tab.
fn effective_category(params: &ListParams) -> Option<&str> {
    params.category.as_deref().filter(|category| *category != "all")
}

pub async fn list_products(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    let deadline = Duration::from_secs(s.config.catalog_timeout_secs);
    match tokio::time::timeout(deadline, fetch_products(&s, &p)).await {
        Ok(Ok(products)) => Ok(Json(products)),
        Ok(Err(err)) => {
            warn!(error = %err, "catalog query failed, serving sample products");
            Ok(Json(sample_products()))
        }
        Err(_) => {
            warn!(timeout_secs = s.config.catalog_timeout_secs, "catalog query timed out, serving sample products");
            Ok(Json(sample_products()))
        }
    }
}

async fn fetch_products(s: &AppState, p: &ListParams) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE ($1::text IS NULL OR category = $1) AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%') ORDER BY display_order, created_at DESC",
    )
    .bind(effective_category(p))
    .bind(p.search.as_deref())
    .fetch_all(&s.db)
    .await
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>, AppError> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("product"))
}

pub async fn admin_list_products(State(s): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY display_order, created_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String, pub description: Option<String>,
    pub price: Decimal, pub original_price: Option<Decimal>,
    pub image_url: Option<String>, pub category: Option<String>,
    pub colors: Option<Vec<String>>, pub features: Option<Vec<String>>,
    pub in_stock: Option<bool>, pub hidden_on_home: Option<bool>, pub display_order: Option<i32>,
}

impl ProductRequest {
    fn check(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("product name is required".into()));
        }
        if self.price < Decimal::ZERO {
            return Err(AppError::Validation("price cannot be negative".into()));
        }
        Ok(())
    }
}

pub async fn create_product(
    State(s): State<AppState>,
    Json(r): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    r.check()?;
    let p = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, description, price, original_price, image_url, category, colors, features, in_stock, hidden_on_home, display_order, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.price)
    .bind(r.original_price)
    .bind(&r.image_url)
    .bind(r.category.as_deref().unwrap_or("all"))
    .bind(r.colors.clone().unwrap_or_default())
    .bind(r.features.clone().unwrap_or_default())
    .bind(r.in_stock.unwrap_or(true))
    .bind(r.hidden_on_home.unwrap_or(false))
    .bind(r.display_order.unwrap_or(0))
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(p)))
}

pub async fn update_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<ProductRequest>,
) -> Result<Json<Product>, AppError> {
    r.check()?;
    let p = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, description = $3, price = $4, original_price = $5, image_url = $6, category = $7, colors = $8, features = $9, in_stock = $10, hidden_on_home = $11, display_order = $12, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.price)
    .bind(r.original_price)
    .bind(&r.image_url)
    .bind(r.category.as_deref().unwrap_or("all"))
    .bind(r.colors.clone().unwrap_or_default())
    .bind(r.features.clone().unwrap_or_default())
    .bind(r.in_stock.unwrap_or(true))
    .bind(r.hidden_on_home.unwrap_or(false))
    .bind(r.display_order.unwrap_or(0))
    .fetch_optional(&s.db)
    .await?
    .ok_or(AppError::NotFound("product"))?;
    Ok(Json(p))
}

pub async fn delete_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("product"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Offline fallback catalog. Stable ids so a cart built against the
/// samples survives a page reload.
pub fn sample_products() -> Vec<Product> {
    let now = Utc::now();
    let sample = |id: u128, name: &str, price: i64, category: &str, order: i32| Product {
        id: Uuid::from_u128(id),
        name: name.to_string(),
        description: None,
        price: Decimal::new(price, 0),
        original_price: None,
        image_url: None,
        category: category.to_string(),
        colors: vec![],
        features: vec![],
        in_stock: true,
        hidden_on_home: false,
        display_order: order,
        created_at: now,
        updated_at: now,
    };
    vec![
        sample(0xD0BE_0001, "Ajazz AK820 Pro", 4500, "keyboard", 1),
        sample(0xD0BE_0002, "Royal Kludge RK84", 8999, "keyboard", 2),
        sample(0xD0BE_0003, "Moondrop Space Travel", 3500, "earbuds", 3),
        sample(0xD0BE_0004, "Attack Shark X3", 2800, "mouse", 4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(category: Option<&str>) -> ListParams {
        ListParams {
            page: None,
            per_page: None,
            category: category.map(str::to_string),
            status: None,
            search: None,
        }
    }

    #[test]
    fn test_all_category_means_no_filter() {
        assert_eq!(effective_category(&params(Some("all"))), None);
        assert_eq!(effective_category(&params(Some("keyboard"))), Some("keyboard"));
        assert_eq!(effective_category(&params(None)), None);
    }

    #[test]
    fn test_sample_products_are_usable() {
        let samples = sample_products();
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|p| p.in_stock));
        assert!(samples.iter().all(|p| p.price > Decimal::ZERO));
        // Stable ids across calls.
        assert_eq!(samples[0].id, sample_products()[0].id);
    }

    #[test]
    fn test_product_request_checks() {
        let request = ProductRequest {
            name: "  ".into(), description: None, price: Decimal::new(100, 0),
            original_price: None, image_url: None, category: None, colors: None,
            features: None, in_stock: None, hidden_on_home: None, display_order: None,
        };
        assert!(request.check().is_err());

        let request = ProductRequest { name: "RK84".into(), price: Decimal::new(-1, 0), ..request };
        assert!(request.check().is_err());
    }
}
