//! Media asset management, plus the upload plumbing shared with the
//! hero-image and QR-code panels. Admin uploads arrive as base64 data
//! URLs, land in a bucket under a timestamped key, and are tracked as
//! rows so they can be listed and deleted later.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::storage::{object_key_from_public_url, timestamped_object_key, ASSETS_BUCKET};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Asset {
    pub id: Uuid, pub bucket: String, pub object_key: String, pub public_url: String,
    pub content_type: String, pub size_bytes: i64, pub uploaded_at: DateTime<Utc>,
}

/// Split an admin-supplied `data:<mime>;base64,<payload>` URL. Unlike
/// receipts there is no MIME allowlist here; the admin panel is trusted
/// and uploads webp, svg and friends.
pub(crate) fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>), AppError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| AppError::Validation("expected a base64 data URL".into()))?;
    let (content_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| AppError::Validation("expected a base64 data URL".into()))?;
    let bytes = BASE64
        .decode(payload)
        .map_err(|err| AppError::Validation(format!("invalid base64 payload: {err}")))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".into()));
    }
    Ok((content_type.to_string(), bytes))
}

/// Decode + upload in one step; returns (object key, public URL,
/// content type, size).
pub(crate) async fn upload_media(
    s: &AppState,
    bucket: &str,
    file_name: &str,
    data_url: &str,
) -> Result<(String, String, String, i64), AppError> {
    let (content_type, bytes) = decode_data_url(data_url)?;
    let size = bytes.len() as i64;
    let key = timestamped_object_key(file_name);
    let url = s.storage.upload(bucket, &key, &content_type, bytes).await?;
    Ok((key, url, content_type, size))
}

/// Best-effort bucket cleanup when a tracked row goes away.
pub(crate) async fn delete_media(s: &AppState, bucket: &str, public_url: &str) {
    let Some(key) = object_key_from_public_url(public_url, bucket) else {
        return;
    };
    if let Err(err) = s.storage.delete(bucket, key).await {
        warn!(bucket, key, error = %err, "failed to delete storage object, row removed anyway");
    }
}

pub async fn list_assets(State(s): State<AppState>) -> Result<Json<Vec<Asset>>, AppError> {
    let assets = sqlx::query_as::<_, Asset>("SELECT * FROM assets ORDER BY uploaded_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(assets))
}

#[derive(Debug, Deserialize)]
pub struct UploadAssetRequest {
    pub file_name: String,
    pub file: String,
}

pub async fn upload_asset(
    State(s): State<AppState>,
    Json(r): Json<UploadAssetRequest>,
) -> Result<(StatusCode, Json<Asset>), AppError> {
    if r.file_name.trim().is_empty() {
        return Err(AppError::Validation("file name is required".into()));
    }
    let (key, url, content_type, size) = upload_media(&s, ASSETS_BUCKET, &r.file_name, &r.file).await?;

    let asset = sqlx::query_as::<_, Asset>(
        "INSERT INTO assets (id, bucket, object_key, public_url, content_type, size_bytes, uploaded_at) VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(ASSETS_BUCKET)
    .bind(&key)
    .bind(&url)
    .bind(&content_type)
    .bind(size)
    .fetch_one(&s.db)
    .await?;

    Ok((StatusCode::CREATED, Json(asset)))
}

pub async fn delete_asset(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    let asset = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("asset"))?;

    delete_media(&s, &asset.bucket, &asset.public_url).await;

    sqlx::query("DELETE FROM assets WHERE id = $1").bind(id).execute(&s.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
