//! Order payload construction.
//!
//! One wire contract is shared by the submission client and the checkout
//! endpoint, so the two sides cannot drift apart. Keys are camelCase on
//! the wire and snake_case here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::checkout::receipt::ReceiptAttachment;
use crate::domain::aggregates::cart::{Cart, CartItem};
use crate::domain::aggregates::checkout::{CustomerInfo, PaymentOption, ReceiverInfo};
use crate::domain::aggregates::order::LineItem;
use crate::domain::value_objects::{Money, OrderId, PhoneError, CURRENCY};

/// One cart line as it appears in the submitted order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_features: Option<Vec<String>>,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn to_line_item(&self) -> LineItem {
        LineItem {
            product_id: self.product_id,
            name: self.name.clone(),
            quantity: self.quantity,
            unit_price: Money::new(self.unit_price, CURRENCY),
        }
    }
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name.clone(),
            unit_price: item.unit_price.amount(),
            quantity: item.quantity,
            image_url: item.image_url.clone(),
            selected_color: item.selected_color.clone(),
            selected_features: item.selected_features.clone(),
        }
    }
}

/// Line quantities land in a Postgres INTEGER column.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// JSON body of `POST /api/checkout`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderRequest {
    pub order_id: OrderId,
    pub customer_info: CustomerInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_info: Option<ReceiverInfo>,
    pub cart: Vec<OrderLine>,
    pub total: Decimal,
    pub payment_option: PaymentOption,
    /// Base64 data URL of the attached receipt, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_file_name: Option<String>,
}

/// JSON body the checkout endpoint answers with.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_db_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    pub message: String,
}

impl SubmitOrderRequest {
    /// Checks the submission client runs before touching the network.
    /// The order id needs no check here: [`OrderId`] is structural.
    pub fn validate_for_send(&self) -> Result<(), PayloadError> {
        if self.customer_info.full_name.trim().is_empty() {
            return Err(PayloadError::MissingCustomerName);
        }
        if self.customer_info.email.trim().is_empty() {
            return Err(PayloadError::MissingCustomerEmail);
        }
        Ok(())
    }

    /// Server-side payload checks. Totals are re-verified against the
    /// payload's own lines when the order aggregate is built, and the
    /// receipt data URL is decoded separately, so neither happens here.
    pub fn validate(&self) -> Result<(), PayloadError> {
        self.validate_for_send()?;
        if self.cart.is_empty() {
            return Err(PayloadError::EmptyCart);
        }
        if self.cart.iter().any(|line| line.quantity == 0) {
            return Err(PayloadError::ZeroQuantity);
        }
        if let Some(line) = self.cart.iter().find(|line| line.quantity > MAX_LINE_QUANTITY) {
            return Err(PayloadError::QuantityTooLarge(line.name.clone()));
        }
        crate::domain::value_objects::PhoneNumber::normalize(&self.customer_info.phone)?;
        if self.payment_option.requires_receipt() && self.receipt_file.is_none() {
            return Err(PayloadError::ReceiptRequired(self.payment_option));
        }
        Ok(())
    }
}

/// Assemble the submission payload from the checkout state.
///
/// Pure apart from the freshly generated order id; the receipt, when
/// present, is folded in as a base64 data URL. The total is read off the
/// cart itself so the payload can never disagree with the summary the
/// customer saw.
pub fn build_order_payload(
    customer: &CustomerInfo,
    receiver: Option<&ReceiverInfo>,
    cart: &Cart,
    payment_option: PaymentOption,
    receipt: Option<&ReceiptAttachment>,
) -> SubmitOrderRequest {
    let mut customer = customer.clone();
    // The flow validated the form already; keep the raw value if someone
    // builds a payload out of band, the server re-checks anyway.
    if let Ok(phone) = customer.normalized_phone() {
        customer.phone = phone.as_str().to_string();
    }
    SubmitOrderRequest {
        order_id: OrderId::generate(),
        customer_info: customer,
        receiver_info: receiver.cloned(),
        cart: cart.items().iter().map(OrderLine::from).collect(),
        total: cart.total().amount(),
        payment_option,
        receipt_file: receipt.map(ReceiptAttachment::to_data_url),
        receipt_file_name: receipt.map(|r| r.file_name().to_string()),
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("customer name is required")]
    MissingCustomerName,
    #[error("customer email is required")]
    MissingCustomerEmail,
    #[error("cart is empty")]
    EmptyCart,
    #[error("cart lines must have a quantity of at least one")]
    ZeroQuantity,
    #[error("quantity for {0} is out of range")]
    QuantityTooLarge(String),
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),
    #[error("payment option {0} requires a receipt")]
    ReceiptRequired(PaymentOption),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Money;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            full_name: "Ram Shrestha".into(),
            email: "ram@example.com".into(),
            phone: "9812345678".into(),
            city: "Kathmandu".into(),
            state: "Bagmati".into(),
            zip_code: "44600".into(),
            full_address: "Kathmandu".into(),
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(CartItem {
            product_id: Uuid::new_v4(),
            name: "Logitech G102".into(),
            unit_price: Money::npr(Decimal::new(2999, 0)),
            quantity: 2,
            image_url: None,
            selected_color: Some("black".into()),
            selected_features: None,
        });
        cart.add_item(CartItem {
            product_id: Uuid::new_v4(),
            name: "Moondrop Chu II".into(),
            unit_price: Money::npr(Decimal::new(2500, 0)),
            quantity: 1,
            image_url: None,
            selected_color: None,
            selected_features: None,
        });
        cart
    }

    #[test]
    fn test_payload_total_matches_cart_summary() {
        let cart = cart();
        let payload = build_order_payload(&customer(), None, &cart, PaymentOption::CashOnDelivery, None);
        assert_eq!(payload.total, cart.total().amount());
        assert_eq!(payload.total, Decimal::new(2999 * 2 + 2500, 0));
        let line_sum: Decimal = payload.cart.iter().map(OrderLine::line_total).sum();
        assert_eq!(payload.total, line_sum);
    }

    #[test]
    fn test_payload_normalizes_phone() {
        let payload = build_order_payload(&customer(), None, &cart(), PaymentOption::CashOnDelivery, None);
        assert_eq!(payload.customer_info.phone, "+9779812345678");
    }

    #[test]
    fn test_cash_on_delivery_carries_no_receipt() {
        let payload = build_order_payload(&customer(), None, &cart(), PaymentOption::CashOnDelivery, None);
        assert!(payload.receipt_file.is_none());
        assert!(payload.receipt_file_name.is_none());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_full_payment_folds_receipt_in() {
        let receipt = ReceiptAttachment::new("esewa.jpg", "image/jpeg", vec![1, 2, 3]).unwrap();
        let payload = build_order_payload(&customer(), None, &cart(), PaymentOption::PayInFull, Some(&receipt));
        assert_eq!(payload.receipt_file_name.as_deref(), Some("esewa.jpg"));
        let data_url = payload.receipt_file.unwrap();
        let decoded = ReceiptAttachment::from_data_url(&data_url, "esewa.jpg").unwrap();
        assert_eq!(decoded.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_each_build_gets_a_fresh_order_id() {
        let cart = cart();
        let a = build_order_payload(&customer(), None, &cart, PaymentOption::CashOnDelivery, None);
        let b = build_order_payload(&customer(), None, &cart, PaymentOption::CashOnDelivery, None);
        assert_ne!(a.order_id, b.order_id);
    }

    #[test]
    fn test_wire_keys_are_camel_case() {
        let payload = build_order_payload(&customer(), None, &cart(), PaymentOption::PayInFull, None);
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("orderId").is_some());
        assert!(json.get("customerInfo").is_some());
        assert!(json.get("paymentOption").is_some());
        assert_eq!(json["paymentOption"], "payInFull");
        assert!(json["cart"][0].get("productId").is_some());
        assert!(json["cart"][0].get("unitPrice").is_some());
        // Absent options stay off the wire entirely.
        assert!(json.get("receiverInfo").is_none());
        assert!(json.get("receiptFile").is_none());
    }

    #[test]
    fn test_validate_for_send_checks_presence() {
        let mut payload = build_order_payload(&customer(), None, &cart(), PaymentOption::CashOnDelivery, None);
        payload.customer_info.full_name = "  ".into();
        assert!(matches!(payload.validate_for_send(), Err(PayloadError::MissingCustomerName)));
        payload.customer_info.full_name = "Ram".into();
        payload.customer_info.email = String::new();
        assert!(matches!(payload.validate_for_send(), Err(PayloadError::MissingCustomerEmail)));
    }

    #[test]
    fn test_validate_flags_missing_receipt_for_full_payment() {
        let payload = build_order_payload(&customer(), None, &cart(), PaymentOption::PayInFull, None);
        assert!(matches!(payload.validate(), Err(PayloadError::ReceiptRequired(PaymentOption::PayInFull))));
    }

    #[test]
    fn test_validate_rejects_empty_cart_and_zero_quantity() {
        let mut payload = build_order_payload(&customer(), None, &cart(), PaymentOption::CashOnDelivery, None);
        payload.cart[0].quantity = 0;
        assert!(matches!(payload.validate(), Err(PayloadError::ZeroQuantity)));
        payload.cart.clear();
        assert!(matches!(payload.validate(), Err(PayloadError::EmptyCart)));
    }

    #[test]
    fn test_validate_bounds_line_quantity() {
        let mut payload = build_order_payload(&customer(), None, &cart(), PaymentOption::CashOnDelivery, None);
        payload.cart[0].quantity = u32::MAX;
        assert!(matches!(payload.validate(), Err(PayloadError::QuantityTooLarge(name)) if name == "Logitech G102"));
        payload.cart[0].quantity = MAX_LINE_QUANTITY;
        assert!(payload.validate().is_ok());
    }
}
