//! Hero carousel management. The storefront only ever sees active
//! entries in display order; the admin panel manages the full set and
//! can upload the artwork inline.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::assets::{delete_media, upload_media};
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::HERO_IMAGES_BUCKET;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HeroImage {
    pub id: Uuid, pub image_url: String,
    pub title: Option<String>, pub subtitle: Option<String>,
    pub cta_text: Option<String>, pub cta_link: Option<String>,
    pub display_order: i32, pub active: bool,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

pub async fn list_active_hero_images(State(s): State<AppState>) -> Result<Json<Vec<HeroImage>>, AppError> {
    let images = sqlx::query_as::<_, HeroImage>("SELECT * FROM hero_images WHERE active ORDER BY display_order")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(images))
}

pub async fn admin_list_hero_images(State(s): State<AppState>) -> Result<Json<Vec<HeroImage>>, AppError> {
    let images = sqlx::query_as::<_, HeroImage>("SELECT * FROM hero_images ORDER BY display_order")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(images))
}

#[derive(Debug, Deserialize)]
pub struct HeroImageRequest {
    pub image_url: Option<String>,
    pub image_file: Option<String>,
    pub file_name: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
}

/// Inline upload wins over a pasted URL; one of the two must be there.
async fn resolve_image_url(
    s: &AppState,
    image_file: Option<&str>,
    file_name: Option<&str>,
    image_url: Option<&str>,
) -> Result<String, AppError> {
    if let Some(data_url) = image_file {
        let name = file_name.unwrap_or("hero-image");
        let (_, url, _, _) = upload_media(s, HERO_IMAGES_BUCKET, name, data_url).await?;
        return Ok(url);
    }
    image_url
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("either image_file or image_url is required".into()))
}

pub async fn create_hero_image(
    State(s): State<AppState>,
    Json(r): Json<HeroImageRequest>,
) -> Result<(StatusCode, Json<HeroImage>), AppError> {
    let image_url =
        resolve_image_url(&s, r.image_file.as_deref(), r.file_name.as_deref(), r.image_url.as_deref()).await?;

    let image = sqlx::query_as::<_, HeroImage>(
        "INSERT INTO hero_images (id, image_url, title, subtitle, cta_text, cta_link, display_order, active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&image_url)
    .bind(&r.title)
    .bind(&r.subtitle)
    .bind(&r.cta_text)
    .bind(&r.cta_link)
    .bind(r.display_order.unwrap_or(0))
    .bind(r.active.unwrap_or(true))
    .fetch_one(&s.db)
    .await?;

    Ok((StatusCode::CREATED, Json(image)))
}

pub async fn update_hero_image(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<HeroImageRequest>,
) -> Result<Json<HeroImage>, AppError> {
    let current = sqlx::query_as::<_, HeroImage>("SELECT * FROM hero_images WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("hero image"))?;

    let image_url = if r.image_file.is_some() || r.image_url.is_some() {
        resolve_image_url(&s, r.image_file.as_deref(), r.file_name.as_deref(), r.image_url.as_deref()).await?
    } else {
        current.image_url.clone()
    };

    let image = sqlx::query_as::<_, HeroImage>(
        "UPDATE hero_images SET image_url = $2, title = $3, subtitle = $4, cta_text = $5, cta_link = $6, display_order = $7, active = $8, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&image_url)
    .bind(&r.title)
    .bind(&r.subtitle)
    .bind(&r.cta_text)
    .bind(&r.cta_link)
    .bind(r.display_order.unwrap_or(current.display_order))
    .bind(r.active.unwrap_or(current.active))
    .fetch_one(&s.db)
    .await?;

    if image.image_url != current.image_url {
        delete_media(&s, HERO_IMAGES_BUCKET, &current.image_url).await;
    }

    Ok(Json(image))
}

pub async fn delete_hero_image(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    let current = sqlx::query_as::<_, HeroImage>("SELECT * FROM hero_images WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("hero image"))?;

    delete_media(&s, HERO_IMAGES_BUCKET, &current.image_url).await;

    sqlx::query("DELETE FROM hero_images WHERE id = $1").bind(id).execute(&s.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
