//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::checkout::{CustomerInfo, PaymentOption, ReceiverInfo};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::{Money, OrderId};

#[derive(Clone, Debug)]
pub struct Order {
    order_id: OrderId,
    customer: CustomerInfo,
    receiver: Option<ReceiverInfo>,
    items: Vec<LineItem>,
    total: Money,
    payment_option: PaymentOption,
    payment_status: PaymentStatus,
    order_status: OrderStatus,
    receipt_url: Option<String>,
    receipt_file_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<OrderEvent>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaymentStatus { #[default] Pending, Paid, Refunded }

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(OrderError::UnknownStatus(s.to_string())),
        }
    }
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            _ => Err(OrderError::UnknownStatus(s.to_string())),
        }
    }
}

impl Order {
    /// Build a freshly placed order from an already validated submission.
    ///
    /// Receipt-backed options (full payment, deposit) start out
    /// `processing` since payment evidence was supplied; cash on delivery
    /// starts `pending`. Payment always starts `pending` until an admin
    /// verifies the receipt.
    pub fn place(
        order_id: OrderId,
        customer: CustomerInfo,
        receiver: Option<ReceiverInfo>,
        items: Vec<LineItem>,
        total: Money,
        payment_option: PaymentOption,
        receipt_url: Option<String>,
        receipt_file_name: Option<String>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        let computed = items.iter().fold(Money::zero(total.currency()), |acc, i| {
            acc.add(&i.line_total()).unwrap_or(acc)
        });
        if computed.amount() != total.amount() {
            return Err(OrderError::TotalMismatch { submitted: total.amount(), computed: computed.amount() });
        }

        let order_status = if payment_option.requires_receipt() {
            OrderStatus::Processing
        } else {
            OrderStatus::Pending
        };
        let now = Utc::now();
        let mut order = Self {
            order_id: order_id.clone(),
            customer: customer.clone(),
            receiver,
            items,
            total: total.clone(),
            payment_option,
            payment_status: PaymentStatus::Pending,
            order_status,
            receipt_url,
            receipt_file_name,
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        order.raise_event(OrderEvent::Placed {
            order_id: order_id.as_str().to_string(),
            customer_email: customer.email,
            total: total.amount(),
            payment_option: payment_option.as_str().to_string(),
        });
        Ok(order)
    }

    pub fn order_id(&self) -> &OrderId { &self.order_id }
    pub fn customer(&self) -> &CustomerInfo { &self.customer }
    pub fn receiver(&self) -> Option<&ReceiverInfo> { self.receiver.as_ref() }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn total(&self) -> &Money { &self.total }
    pub fn payment_option(&self) -> PaymentOption { self.payment_option }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn order_status(&self) -> OrderStatus { self.order_status }
    pub fn receipt_url(&self) -> Option<&str> { self.receipt_url.as_deref() }
    pub fn receipt_file_name(&self) -> Option<&str> { self.receipt_file_name.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Admin status update. Cancelled orders are frozen, and a delivered
    /// order can no longer be cancelled.
    pub fn update_status(
        &mut self,
        order_status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> Result<(), OrderError> {
        if let Some(next) = order_status {
            validate_status_change(self.order_status, next)?;
            self.order_status = next;
        }
        if let Some(next) = payment_status {
            self.payment_status = next;
        }
        self.touch();
        self.raise_event(OrderEvent::StatusChanged {
            order_id: self.order_id.as_str().to_string(),
            order_status: self.order_status.as_str().to_string(),
            payment_status: self.payment_status.as_str().to_string(),
        });
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<OrderEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: OrderEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// Transition rules for order status, shared with the admin update path
/// which works on stored rows rather than a hydrated aggregate.
pub fn validate_status_change(current: OrderStatus, next: OrderStatus) -> Result<(), OrderError> {
    if current == OrderStatus::Cancelled && next != OrderStatus::Cancelled {
        return Err(OrderError::CancelledIsFinal);
    }
    if current == OrderStatus::Delivered && next == OrderStatus::Cancelled {
        return Err(OrderError::CannotCancel);
    }
    Ok(())
}

#[derive(Debug, Clone, Error)]
pub enum OrderError {
    #[error("an order needs at least one item")]
    NoItems,
    #[error("submitted total {submitted} does not match the item sum {computed}")]
    TotalMismatch { submitted: Decimal, computed: Decimal },
    #[error("a delivered order cannot be cancelled")]
    CannotCancel,
    #[error("a cancelled order cannot change status")]
    CancelledIsFinal,
    #[error("unknown status value: {0}")]
    UnknownStatus(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            full_name: "Ram Shrestha".into(),
            email: "ram@example.com".into(),
            phone: "+9779812345678".into(),
            city: "Kathmandu".into(),
            state: "Bagmati".into(),
            zip_code: "44600".into(),
            full_address: "Kathmandu".into(),
        }
    }

    fn line(price: i64, qty: u32) -> LineItem {
        LineItem {
            product_id: Uuid::new_v4(),
            name: "Ajazz AK820".into(),
            quantity: qty,
            unit_price: Money::npr(Decimal::new(price, 0)),
        }
    }

    fn place(option: PaymentOption) -> Order {
        Order::place(
            OrderId::generate(),
            customer(),
            None,
            vec![line(4500, 2)],
            Money::npr(Decimal::new(9000, 0)),
            option,
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_place_requires_items() {
        let result = Order::place(
            OrderId::generate(),
            customer(),
            None,
            vec![],
            Money::npr(Decimal::ZERO),
            PaymentOption::CashOnDelivery,
            None,
            None,
        );
        assert!(matches!(result, Err(OrderError::NoItems)));
    }

    #[test]
    fn test_place_rejects_total_mismatch() {
        let result = Order::place(
            OrderId::generate(),
            customer(),
            None,
            vec![line(4500, 2)],
            Money::npr(Decimal::new(1, 0)),
            PaymentOption::CashOnDelivery,
            None,
            None,
        );
        assert!(matches!(result, Err(OrderError::TotalMismatch { .. })));
    }

    #[test]
    fn test_initial_statuses_follow_payment_option() {
        assert_eq!(place(PaymentOption::CashOnDelivery).order_status(), OrderStatus::Pending);
        assert_eq!(place(PaymentOption::PayInFull).order_status(), OrderStatus::Processing);
        assert_eq!(place(PaymentOption::Deposit).order_status(), OrderStatus::Processing);
        assert_eq!(place(PaymentOption::PayInFull).payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_placing_raises_event() {
        let mut order = place(PaymentOption::PayInFull);
        let events = order.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], OrderEvent::Placed { .. }));
        assert!(order.take_events().is_empty());
    }

    #[test]
    fn test_status_update_workflow() {
        let mut order = place(PaymentOption::PayInFull);
        order.update_status(Some(OrderStatus::Shipped), Some(PaymentStatus::Paid)).unwrap();
        assert_eq!(order.order_status(), OrderStatus::Shipped);
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        order.update_status(Some(OrderStatus::Delivered), None).unwrap();
        assert_eq!(order.order_status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_delivered_cannot_be_cancelled() {
        let mut order = place(PaymentOption::CashOnDelivery);
        order.update_status(Some(OrderStatus::Delivered), None).unwrap();
        let result = order.update_status(Some(OrderStatus::Cancelled), None);
        assert!(matches!(result, Err(OrderError::CannotCancel)));
    }

    #[test]
    fn test_cancelled_is_frozen() {
        let mut order = place(PaymentOption::CashOnDelivery);
        order.update_status(Some(OrderStatus::Cancelled), None).unwrap();
        let result = order.update_status(Some(OrderStatus::Processing), None);
        assert!(matches!(result, Err(OrderError::CancelledIsFinal)));
    }

    #[test]
    fn test_status_change_rules_standalone() {
        assert!(validate_status_change(OrderStatus::Pending, OrderStatus::Shipped).is_ok());
        assert!(validate_status_change(OrderStatus::Cancelled, OrderStatus::Cancelled).is_ok());
        assert!(matches!(
            validate_status_change(OrderStatus::Cancelled, OrderStatus::Pending),
            Err(OrderError::CancelledIsFinal)
        ));
        assert!(matches!(
            validate_status_change(OrderStatus::Delivered, OrderStatus::Cancelled),
            Err(OrderError::CannotCancel)
        ));
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        for status in [PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Refunded] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<OrderStatus>().is_err());
    }
}
