//! Domain events
//!
//! Raised by aggregates and published best-effort to NATS when a broker is
//! configured. Nothing in the order path waits on a subscriber.

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed {
        order_id: String,
        customer_email: String,
        total: Decimal,
        payment_option: String,
    },
    StatusChanged {
        order_id: String,
        order_status: String,
        payment_status: String,
    },
    Deleted {
        order_id: String,
    },
}

impl OrderEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "orders.placed",
            Self::StatusChanged { .. } => "orders.status_changed",
            Self::Deleted { .. } => "orders.deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_subjects() {
        let placed = OrderEvent::Placed {
            order_id: "DOPE-1-AAAAAAAAA".into(),
            customer_email: "ram@example.com".into(),
            total: Decimal::new(100, 0),
            payment_option: "cashOnDelivery".into(),
        };
        assert_eq!(placed.subject(), "orders.placed");
        let json = serde_json::to_value(&placed).unwrap();
        assert_eq!(json["type"], "placed");
        assert_eq!(json["order_id"], "DOPE-1-AAAAAAAAA");
    }
}
