//! Submission client.
//!
//! Thin wrapper over the checkout endpoint. There is no retry and no
//! idempotency key: a failed attempt retried by the customer goes through
//! [`build_order_payload`](crate::checkout::payload::build_order_payload)
//! again and therefore creates a distinct order.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use uuid::Uuid;

use crate::checkout::payload::{CheckoutResponse, PayloadError, SubmitOrderRequest};
use crate::domain::value_objects::OrderId;

/// Message shown when the server gave us nothing better.
pub const GENERIC_FAILURE: &str = "Order submission failed. Please try again.";

/// Seam between the checkout flow and the transport, so flows can be
/// driven in tests without a server.
#[async_trait]
pub trait SubmitOrder: Send + Sync {
    async fn submit(&self, payload: &SubmitOrderRequest) -> Result<SubmitSuccess, SubmitError>;
}

/// What a successful submission reports back.
#[derive(Clone, Debug)]
pub struct SubmitSuccess {
    pub order_id: OrderId,
    pub order_db_id: Option<Uuid>,
    pub receipt_url: Option<String>,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(#[from] PayloadError),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("could not reach the checkout service: {0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP client for the checkout endpoint.
#[derive(Debug, Clone)]
pub struct CheckoutClient {
    base_url: String,
    http: Client,
}

impl CheckoutClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, http: Client::new() }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/checkout", self.base_url)
    }
}

#[async_trait]
impl SubmitOrder for CheckoutClient {
    async fn submit(&self, payload: &SubmitOrderRequest) -> Result<SubmitSuccess, SubmitError> {
        payload.validate_for_send()?;

        let response = self.http.post(self.endpoint()).json(payload).send().await?;
        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();

        if !status.is_success() {
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: failure_message(&body),
            });
        }

        let parsed: CheckoutResponse = serde_json::from_slice(&body).map_err(|_| {
            SubmitError::Rejected { status: status.as_u16(), message: GENERIC_FAILURE.to_string() }
        })?;
        if !parsed.success {
            return Err(SubmitError::Rejected { status: status.as_u16(), message: parsed.message });
        }

        Ok(SubmitSuccess {
            order_id: payload.order_id.clone(),
            order_db_id: parsed.order_db_id,
            receipt_url: parsed.receipt_url,
            message: parsed.message,
        })
    }
}

/// Pull the server's `message` out of an error body, falling back to the
/// generic line when the body is not what we expect.
fn failure_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::payload::build_order_payload;
    use crate::domain::aggregates::cart::{Cart, CartItem};
    use crate::domain::aggregates::checkout::{CustomerInfo, PaymentOption};
    use crate::domain::value_objects::Money;
    use rust_decimal::Decimal;

    #[test]
    fn test_failure_message_prefers_server_text() {
        let body = br#"{"success":false,"message":"cart is empty"}"#;
        assert_eq!(failure_message(body), "cart is empty");
    }

    #[test]
    fn test_failure_message_falls_back_on_garbage() {
        assert_eq!(failure_message(b"<html>502</html>"), GENERIC_FAILURE);
        assert_eq!(failure_message(br#"{"message":""}"#), GENERIC_FAILURE);
        assert_eq!(failure_message(b""), GENERIC_FAILURE);
    }

    #[test]
    fn test_endpoint_trims_trailing_slashes() {
        let client = CheckoutClient::new("http://localhost:8083///");
        assert_eq!(client.endpoint(), "http://localhost:8083/api/checkout");
    }

    #[tokio::test]
    async fn test_invalid_payload_never_hits_the_network() {
        // An unroutable base URL: reaching it would error differently.
        let client = CheckoutClient::new("http://droppedpackets.invalid");
        let mut cart = Cart::new();
        cart.add_item(CartItem {
            product_id: uuid::Uuid::new_v4(),
            name: "Cable".into(),
            unit_price: Money::npr(Decimal::new(500, 0)),
            quantity: 1,
            image_url: None,
            selected_color: None,
            selected_features: None,
        });
        let mut payload = build_order_payload(
            &CustomerInfo { full_name: "Ram".into(), email: "ram@example.com".into(), ..Default::default() },
            None,
            &cart,
            PaymentOption::CashOnDelivery,
            None,
        );
        payload.customer_info.email.clear();

        let result = client.submit(&payload).await;
        assert!(matches!(result, Err(SubmitError::Invalid(PayloadError::MissingCustomerEmail))));
    }
}
