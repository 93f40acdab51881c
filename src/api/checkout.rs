//! Order intake.
//!
//! `POST /api/checkout` runs the whole pipeline for one submission:
//! payload validation, receipt decode + upload, order persistence, then
//! best-effort notifications. The order row and its items commit in one
//! transaction; the receipt upload and the emails are allowed to fail
//! without losing the sale.

use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::checkout::payload::{CheckoutResponse, OrderLine, SubmitOrderRequest};
use crate::checkout::receipt::ReceiptAttachment;
use crate::domain::aggregates::checkout::{CustomerInfo, PaymentOption, ReceiverInfo};
use crate::domain::aggregates::order::Order;
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::{Money, OrderId, CURRENCY};
use crate::email::dispatch_order_emails;
use crate::email::templates::{EmailLine, OrderEmail, ReceiverBlock};
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::{receipt_object_key, RECEIPTS_BUCKET};

pub async fn submit_order(
    State(s): State<AppState>,
    Json(request): Json<SubmitOrderRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    request.validate()?;

    // Decode before touching the database so a bad attachment rejects the
    // whole submission, not just the upload.
    let receipt = match &request.receipt_file {
        Some(data_url) => {
            let file_name = request.receipt_file_name.as_deref().unwrap_or("receipt");
            Some(ReceiptAttachment::from_data_url(data_url, file_name)?)
        }
        None => None,
    };

    let receipt_url = match &receipt {
        Some(attachment) => {
            let key = receipt_object_key(&request.order_id, attachment.extension());
            match s
                .storage
                .upload(RECEIPTS_BUCKET, &key, attachment.content_type(), attachment.bytes().to_vec())
                .await
            {
                Ok(url) => Some(url),
                Err(err) => {
                    warn!(order_id = %request.order_id, error = %err, "receipt upload failed, order continues without a receipt url");
                    None
                }
            }
        }
        None => None,
    };

    let items = request.cart.iter().map(OrderLine::to_line_item).collect();
    let mut order = Order::place(
        request.order_id.clone(),
        request.customer_info.clone(),
        request.receiver_info.clone(),
        items,
        Money::new(request.total, CURRENCY),
        request.payment_option,
        receipt_url.clone(),
        receipt.as_ref().map(|r| r.file_name().to_string()),
    )?;
    let events = order.take_events();

    let db_id = persist_order(&s, &order).await?;
    info!(order_id = %order.order_id(), db_id = %db_id, total = %order.total().amount(), "order placed");

    publish_events(&s, events).await;

    let email = OrderEmail::from_request(&request, receipt_url.as_deref());
    let mailer = s.mailer.clone();
    let admin_inbox = s.config.admin_notify_email.clone();
    tokio::spawn(async move {
        dispatch_order_emails(&mailer, admin_inbox.as_deref(), &email).await;
    });

    Ok(Json(CheckoutResponse {
        success: true,
        order_id: order.order_id().as_str().to_string(),
        order_db_id: Some(db_id),
        receipt_url,
        message: "Order placed successfully".to_string(),
    }))
}

/// Order row + line items in a single transaction.
async fn persist_order(s: &AppState, order: &Order) -> Result<Uuid, AppError> {
    let mut tx = s.db.begin().await?;

    let receiver = order.receiver();
    let db_id: (Uuid,) = sqlx::query_as(
        "INSERT INTO orders (id, order_id, customer_name, customer_email, customer_phone, customer_city, customer_state, customer_zip, customer_address, \
         receiver_name, receiver_phone, receiver_city, receiver_state, receiver_zip, receiver_address, \
         total_amount, payment_option, payment_status, order_status, receipt_url, receipt_file_name, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $22) RETURNING id",
    )
    .bind(Uuid::now_v7())
    .bind(order.order_id().as_str())
    .bind(&order.customer().full_name)
    .bind(&order.customer().email)
    .bind(&order.customer().phone)
    .bind(&order.customer().city)
    .bind(&order.customer().state)
    .bind(&order.customer().zip_code)
    .bind(&order.customer().full_address)
    .bind(receiver.map(|r| r.full_name.clone()))
    .bind(receiver.map(|r| r.phone.clone()))
    .bind(receiver.map(|r| r.city.clone()))
    .bind(receiver.map(|r| r.state.clone()))
    .bind(receiver.map(|r| r.zip_code.clone()))
    .bind(receiver.map(|r| r.full_address.clone()))
    .bind(order.total().amount())
    .bind(order.payment_option().as_str())
    .bind(order.payment_status().as_str())
    .bind(order.order_status().as_str())
    .bind(order.receipt_url())
    .bind(order.receipt_file_name())
    .bind(order.created_at())
    .fetch_one(&mut *tx)
    .await?;

    for item in order.items() {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, name, quantity, price) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::now_v7())
        .bind(db_id.0)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.quantity as i32)
        .bind(item.unit_price.amount())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(db_id.0)
}

/// Fire-and-forget event publication; a dead broker never blocks a sale.
pub(crate) async fn publish_events(s: &AppState, events: Vec<OrderEvent>) {
    let Some(nats) = &s.nats else { return };
    for event in events {
        let payload = match serde_json::to_vec(&event) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "failed to serialize order event");
                continue;
            }
        };
        if let Err(err) = nats.publish(event.subject().to_string(), payload.into()).await {
            warn!(subject = event.subject(), error = %err, "failed to publish order event");
        }
    }
}

/// Re-dispatch both notification emails for an already persisted order.
/// Always best-effort: the response only says the dispatch ran.
pub async fn send_order_emails(
    State(s): State<AppState>,
    Json(request): Json<OrderEmailsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    info!(order_id = %request.order_id, db_id = ?request.order_db_id, "re-dispatching order emails");
    let order = OrderEmail {
        order_id: request.order_id.as_str().to_string(),
        customer_name: request.customer_info.full_name.clone(),
        customer_email: request.customer_info.email.clone(),
        customer_phone: request.customer_info.phone.clone(),
        full_address: request.customer_info.full_address.clone(),
        receiver: request.receiver_info.as_ref().map(|receiver| ReceiverBlock {
            full_name: receiver.full_name.clone(),
            phone: receiver.phone.clone(),
            full_address: receiver.full_address.clone(),
        }),
        lines: request
            .cart
            .iter()
            .map(|line| EmailLine {
                name: line.name.clone(),
                quantity: line.quantity,
                line_total: line.line_total(),
            })
            .collect(),
        total: request.total,
        payment_option: request.payment_option,
        receipt_url: request.receipt_url.clone(),
    };

    dispatch_order_emails(&s.mailer, s.config.admin_notify_email.as_deref(), &order).await;

    Ok(Json(serde_json::json!({ "success": true, "message": "Order emails dispatched" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEmailsRequest {
    pub order_id: OrderId,
    #[serde(default)]
    pub order_db_id: Option<Uuid>,
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub receiver_info: Option<ReceiverInfo>,
    pub cart: Vec<OrderLine>,
    pub total: Decimal,
    pub payment_option: PaymentOption,
    #[serde(default)]
    pub receipt_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_emails_request_accepts_storefront_wire_shape() {
        let db_id = Uuid::new_v4();
        let request: OrderEmailsRequest = serde_json::from_value(serde_json::json!({
            "orderId": "DOPE-1736603461000-7GK2MQ4XZ",
            "orderDbId": db_id,
            "customerInfo": {
                "fullName": "Ram Shrestha",
                "email": "ram@example.com",
                "phone": "+9779812345678",
                "city": "Kathmandu",
                "state": "Bagmati",
                "zipCode": "44600",
                "fullAddress": "Baneshwor, Kathmandu"
            },
            "cart": [
                { "productId": Uuid::new_v4(), "name": "RK84", "unitPrice": 8999.0, "quantity": 1 }
            ],
            "total": 8999.0,
            "paymentOption": "cashOnDelivery"
        }))
        .unwrap();

        assert_eq!(request.order_id.as_str(), "DOPE-1736603461000-7GK2MQ4XZ");
        assert_eq!(request.order_db_id, Some(db_id));
        assert!(request.receiver_info.is_none());
        assert!(request.receipt_url.is_none());
        assert_eq!(request.payment_option, PaymentOption::CashOnDelivery);
    }
}
