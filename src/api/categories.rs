//! Category endpoints. Categories are keyed by slug; `all` is the
//! built-in storefront tab every product falls back to and it cannot be
//! removed.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

pub const DEFAULT_CATEGORY: &str = "all";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: String, pub name: String, pub description: Option<String>,
    pub display_order: i32, pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

pub async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY display_order, name")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(categories))
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub display_order: Option<i32>,
}

fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

pub async fn create_category(
    State(s): State<AppState>,
    Json(r): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    if r.name.trim().is_empty() {
        return Err(AppError::Validation("category name is required".into()));
    }
    let id = r.id.clone().unwrap_or_else(|| slugify(&r.name));
    let c = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, description, display_order, created_at, updated_at) VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING *",
    )
    .bind(&id)
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.display_order.unwrap_or(0))
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(c)))
}

pub async fn update_category(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(r): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    if r.name.trim().is_empty() {
        return Err(AppError::Validation("category name is required".into()));
    }
    let c = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2, description = $3, display_order = $4, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(&id)
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.display_order.unwrap_or(0))
    .fetch_optional(&s.db)
    .await?
    .ok_or(AppError::NotFound("category"))?;
    Ok(Json(c))
}

/// The `all` slug is the catalog's fallback bucket; products whose
/// category is deleted land there, so it must always exist.
pub fn ensure_category_deletable(id: &str) -> Result<(), AppError> {
    if id == DEFAULT_CATEGORY {
        return Err(AppError::Protected("the default category cannot be deleted".into()));
    }
    Ok(())
}

pub async fn delete_category(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    ensure_category_deletable(&id)?;
    let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(&id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("category"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_category_is_protected() {
        assert!(matches!(ensure_category_deletable("all"), Err(AppError::Protected(_))));
        assert!(ensure_category_deletable("keyboard").is_ok());
        assert!(ensure_category_deletable("ALL").is_ok());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Gaming Keyboards"), "gaming-keyboards");
        assert_eq!(slugify("  Mice  "), "mice");
    }
}
