//! Aggregates module
pub mod cart;
pub mod checkout;
pub mod order;

pub use cart::{Cart, CartError, CartItem};
pub use checkout::{
    transition, CheckoutError, CheckoutEvent, CheckoutForm, CheckoutStep, CustomerInfo,
    PaymentOption, ReceiverInfo, Transition,
};
pub use order::{LineItem, Order, OrderError, OrderStatus, PaymentStatus};
