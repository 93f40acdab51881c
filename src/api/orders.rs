//! Admin order management: paginated listing, detail with line items,
//! status updates through the aggregate's transition rules, and delete
//! (line items cascade at the schema level).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::checkout::publish_events;
use crate::api::{ListParams, PaginatedResponse};
use crate::domain::aggregates::order::{validate_status_change, OrderStatus, PaymentStatus};
use crate::domain::events::OrderEvent;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid, pub order_id: String,
    pub customer_name: String, pub customer_email: String, pub customer_phone: String,
    pub customer_city: String, pub customer_state: String, pub customer_zip: String, pub customer_address: String,
    pub receiver_name: Option<String>, pub receiver_phone: Option<String>, pub receiver_city: Option<String>,
    pub receiver_state: Option<String>, pub receiver_zip: Option<String>, pub receiver_address: Option<String>,
    pub total_amount: Decimal, pub payment_option: String, pub payment_status: String, pub order_status: String,
    pub receipt_url: Option<String>, pub receipt_file_name: Option<String>,
    pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: Uuid, pub order_id: Uuid, pub product_id: Option<Uuid>,
    pub name: String, pub quantity: i32, pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: OrderRow,
    pub items: Vec<OrderItemRow>,
}

pub async fn list_orders(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<OrderRow>>, AppError> {
    let orders = sqlx::query_as::<_, OrderRow>(
        "SELECT * FROM orders WHERE ($3::text IS NULL OR order_status = $3) AND ($4::text IS NULL OR order_id ILIKE '%' || $4 || '%' OR customer_name ILIKE '%' || $4 || '%') \
         ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(p.per_page() as i64)
    .bind(p.offset())
    .bind(p.status.as_deref())
    .bind(p.search.as_deref())
    .fetch_all(&s.db)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR order_status = $1) AND ($2::text IS NULL OR order_id ILIKE '%' || $2 || '%' OR customer_name ILIKE '%' || $2 || '%')",
    )
    .bind(p.status.as_deref())
    .bind(p.search.as_deref())
    .fetch_one(&s.db)
    .await?;

    Ok(Json(PaginatedResponse { data: orders, total: total.0, page: p.page() }))
}

pub async fn get_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<OrderDetail>, AppError> {
    let order = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("order"))?;

    let items = sqlx::query_as::<_, OrderItemRow>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(id)
        .fetch_all(&s.db)
        .await?;

    Ok(Json(OrderDetail { order, items }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub order_status: Option<String>,
    pub payment_status: Option<String>,
}

pub async fn update_order_status(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UpdateStatusRequest>,
) -> Result<Json<OrderRow>, AppError> {
    let current = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("order"))?;

    let next_order_status = match &r.order_status {
        Some(raw) => {
            let next: OrderStatus = raw.parse()?;
            validate_status_change(current.order_status.parse()?, next)?;
            next
        }
        None => current.order_status.parse()?,
    };
    let next_payment_status: PaymentStatus = match &r.payment_status {
        Some(raw) => raw.parse()?,
        None => current.payment_status.parse()?,
    };

    let updated = sqlx::query_as::<_, OrderRow>(
        "UPDATE orders SET order_status = $2, payment_status = $3, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(next_order_status.as_str())
    .bind(next_payment_status.as_str())
    .fetch_one(&s.db)
    .await?;

    publish_events(
        &s,
        vec![OrderEvent::StatusChanged {
            order_id: updated.order_id.clone(),
            order_status: updated.order_status.clone(),
            payment_status: updated.payment_status.clone(),
        }],
    )
    .await;

    Ok(Json(updated))
}

pub async fn delete_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    let order_id: Option<(String,)> = sqlx::query_as("SELECT order_id FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?;
    let Some((order_id,)) = order_id else {
        return Err(AppError::NotFound("order"));
    };

    sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(&s.db).await?;

    publish_events(&s, vec![OrderEvent::Deleted { order_id }]).await;

    Ok(StatusCode::NO_CONTENT)
}
