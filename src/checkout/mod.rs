//! The buying side of the store: receipt handling, the order payload,
//! the submission client and the step-machine driver.

pub mod client;
pub mod flow;
pub mod payload;
pub mod receipt;

pub use client::{CheckoutClient, SubmitError, SubmitOrder, SubmitSuccess};
pub use flow::{CheckoutFlow, Confirmation, FlowError};
pub use payload::{build_order_payload, CheckoutResponse, OrderLine, PayloadError, SubmitOrderRequest};
pub use receipt::{ReceiptAttachment, ReceiptError, ALLOWED_RECEIPT_TYPES, MAX_RECEIPT_BYTES};
