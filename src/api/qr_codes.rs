//! Payment QR codes. The payment step of checkout shows exactly one
//! active code, so activating a code deactivates the rest in the same
//! transaction.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::assets::{delete_media, upload_media};
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::QR_CODES_BUCKET;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QrCode {
    pub id: Uuid, pub name: String, pub image_url: String,
    pub active: bool, pub display_order: i32,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

/// What the checkout payment screen renders. `null` when no code is
/// active; the storefront falls back to its bundled artwork.
pub async fn get_active_qr_code(State(s): State<AppState>) -> Result<Json<Option<QrCode>>, AppError> {
    let code = sqlx::query_as::<_, QrCode>("SELECT * FROM qr_codes WHERE active ORDER BY display_order LIMIT 1")
        .fetch_optional(&s.db)
        .await?;
    Ok(Json(code))
}

pub async fn list_qr_codes(State(s): State<AppState>) -> Result<Json<Vec<QrCode>>, AppError> {
    let codes = sqlx::query_as::<_, QrCode>("SELECT * FROM qr_codes ORDER BY display_order, created_at")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(codes))
}

#[derive(Debug, Deserialize)]
pub struct QrCodeRequest {
    pub name: String,
    pub image_url: Option<String>,
    pub image_file: Option<String>,
    pub file_name: Option<String>,
    pub active: Option<bool>,
    pub display_order: Option<i32>,
}

pub async fn create_qr_code(
    State(s): State<AppState>,
    Json(r): Json<QrCodeRequest>,
) -> Result<(StatusCode, Json<QrCode>), AppError> {
    if r.name.trim().is_empty() {
        return Err(AppError::Validation("qr code name is required".into()));
    }

    let image_url = match &r.image_file {
        Some(data_url) => {
            let name = r.file_name.as_deref().unwrap_or(&r.name);
            let (_, url, _, _) = upload_media(&s, QR_CODES_BUCKET, name, data_url).await?;
            url
        }
        None => r
            .image_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AppError::Validation("either image_file or image_url is required".into()))?,
    };

    let active = r.active.unwrap_or(false);
    let mut tx = s.db.begin().await?;
    if active {
        sqlx::query("UPDATE qr_codes SET active = FALSE, updated_at = NOW() WHERE active")
            .execute(&mut *tx)
            .await?;
    }
    let code = sqlx::query_as::<_, QrCode>(
        "INSERT INTO qr_codes (id, name, image_url, active, display_order, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.name)
    .bind(&image_url)
    .bind(active)
    .bind(r.display_order.unwrap_or(0))
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(code)))
}

pub async fn update_qr_code(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<QrCodeRequest>,
) -> Result<Json<QrCode>, AppError> {
    let current = sqlx::query_as::<_, QrCode>("SELECT * FROM qr_codes WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("qr code"))?;

    let image_url = match &r.image_file {
        Some(data_url) => {
            let name = r.file_name.as_deref().unwrap_or(&r.name);
            let (_, url, _, _) = upload_media(&s, QR_CODES_BUCKET, name, data_url).await?;
            url
        }
        None => r.image_url.clone().filter(|url| !url.trim().is_empty()).unwrap_or_else(|| current.image_url.clone()),
    };

    let active = r.active.unwrap_or(current.active);
    let mut tx = s.db.begin().await?;
    if active {
        sqlx::query("UPDATE qr_codes SET active = FALSE, updated_at = NOW() WHERE active AND id <> $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    let code = sqlx::query_as::<_, QrCode>(
        "UPDATE qr_codes SET name = $2, image_url = $3, active = $4, display_order = $5, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&r.name)
    .bind(&image_url)
    .bind(active)
    .bind(r.display_order.unwrap_or(current.display_order))
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    if code.image_url != current.image_url {
        delete_media(&s, QR_CODES_BUCKET, &current.image_url).await;
    }

    Ok(Json(code))
}

pub async fn delete_qr_code(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    let current = sqlx::query_as::<_, QrCode>("SELECT * FROM qr_codes WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("qr code"))?;

    delete_media(&s, QR_CODES_BUCKET, &current.image_url).await;

    sqlx::query("DELETE FROM qr_codes WHERE id = $1").bind(id).execute(&s.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
