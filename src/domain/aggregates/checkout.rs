//! Checkout Aggregate
//!
//! The order-entry flow, modelled as an explicit state machine instead of
//! the usual pile of string-typed step variables. The flow is mostly
//! linear, with one asymmetric edge: cash on delivery submits straight
//! from payment selection and never visits the receipt-upload step.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::value_objects::{Money, PhoneError, PhoneNumber};
use rust_decimal::Decimal;

/// Customer contact and delivery details, filled field-by-field.
///
/// `full_name`, `email`, `full_address` and a valid phone are required;
/// city, state and zip are kept but never block the flow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub full_address: String,
}

impl CustomerInfo {
    pub fn normalized_phone(&self) -> Result<PhoneNumber, PhoneError> {
        PhoneNumber::normalize(&self.phone)
    }
}

/// Delivery details for "ship to a different address". Same shape as
/// [`CustomerInfo`] minus the email; every field is required once the
/// toggle is on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverInfo {
    #[validate(length(min = 1, message = "Receiver name is required"))]
    pub full_name: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(length(min = 1, message = "Receiver city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "Receiver state is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Receiver zip code is required"))]
    pub zip_code: String,
    #[validate(length(min = 1, message = "Receiver address is required"))]
    pub full_address: String,
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    PhoneNumber::normalize(value).map(|_| ()).map_err(|_| ValidationError::new("phone"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentOption {
    PayInFull,
    CashOnDelivery,
    /// Legacy option: 10% now against a QR code, the rest on delivery.
    Deposit,
}

impl PaymentOption {
    /// Full payment and the deposit option are settled against a QR code,
    /// so a proof-of-payment receipt must be attached before confirming.
    pub fn requires_receipt(self) -> bool {
        !matches!(self, Self::CashOnDelivery)
    }

    pub fn amount_due_now(self, total: &Money) -> Money {
        match self {
            Self::PayInFull => total.clone(),
            Self::CashOnDelivery => Money::zero(total.currency()),
            Self::Deposit => Money::new(total.amount() * Decimal::new(1, 1), total.currency()),
        }
    }

    /// Wire/database spelling, identical to the serde rename.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PayInFull => "payInFull",
            Self::CashOnDelivery => "cashOnDelivery",
            Self::Deposit => "deposit",
        }
    }
}

impl std::str::FromStr for PaymentOption {
    type Err = CheckoutError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payInFull" => Ok(Self::PayInFull),
            "cashOnDelivery" => Ok(Self::CashOnDelivery),
            "deposit" => Ok(Self::Deposit),
            _ => Err(CheckoutError::UnknownPaymentOption(s.to_string())),
        }
    }
}

impl std::fmt::Display for PaymentOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named stage of the order-entry flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutStep {
    CustomerInfo,
    PaymentSelection,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CustomerInfo => "customer-info",
            Self::PaymentSelection => "payment-selection",
            Self::Payment => "payment",
            Self::Confirmation => "confirmation",
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything the checkout screens mutate while the customer types.
#[derive(Clone, Debug, Default)]
pub struct CheckoutForm {
    pub customer: CustomerInfo,
    pub ship_to_different_address: bool,
    pub receiver: ReceiverInfo,
    pub terms_accepted: bool,
    pub payment_option: Option<PaymentOption>,
    pub receipt_attached: bool,
}

impl CheckoutForm {
    /// Whole-form validity gate for leaving the customer-info step.
    pub fn is_customer_info_valid(&self) -> bool {
        self.validate_customer_info().is_ok()
    }

    pub fn validate_customer_info(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.customer.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };
        if !self.terms_accepted {
            errors.add("termsAccepted", ValidationError::new("terms_not_accepted"));
        }
        if self.ship_to_different_address {
            if let Err(receiver_errors) = self.receiver.validate() {
                for (field, field_errors) in receiver_errors.field_errors() {
                    for error in field_errors {
                        errors.add(field, error.clone());
                    }
                }
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// What the customer just did on the current screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutEvent {
    /// Leave the customer-info form.
    ContinueToPayment,
    /// Pick a payment option on the payment-selection screen.
    SelectPayment(PaymentOption),
    /// Confirm on the payment (receipt upload) screen.
    ConfirmPayment,
    /// The submission pipeline reported success.
    SubmissionSucceeded,
    /// Return from payment to payment-selection.
    Back,
    /// Return to the customer-info form.
    EditOrderDetails,
    /// Leave the confirmation screen.
    ContinueShopping,
}

impl CheckoutEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::ContinueToPayment => "continue-to-payment",
            Self::SelectPayment(_) => "select-payment",
            Self::ConfirmPayment => "confirm-payment",
            Self::SubmissionSucceeded => "submission-succeeded",
            Self::Back => "back",
            Self::EditOrderDetails => "edit-order-details",
            Self::ContinueShopping => "continue-shopping",
        }
    }
}

/// Outcome of a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Render this step next.
    Step(CheckoutStep),
    /// Build the payload and run the submission pipeline now. The step
    /// does not change until [`CheckoutEvent::SubmissionSucceeded`].
    Submit,
    /// Leave the terminal step: reset the form and clear the cart.
    Reset,
}

/// The transition function. Pure: reads the form, never mutates it.
pub fn transition(
    step: CheckoutStep,
    event: &CheckoutEvent,
    form: &CheckoutForm,
) -> Result<Transition, CheckoutError> {
    use CheckoutEvent as E;
    use CheckoutStep as S;

    match (step, event) {
        (S::CustomerInfo, E::ContinueToPayment) => {
            form.validate_customer_info().map_err(CheckoutError::InvalidCustomerInfo)?;
            Ok(Transition::Step(S::PaymentSelection))
        }
        // Cash on delivery skips the payment step and submits immediately.
        (S::PaymentSelection, E::SelectPayment(PaymentOption::CashOnDelivery)) => {
            Ok(Transition::Submit)
        }
        (S::PaymentSelection, E::SelectPayment(_)) => Ok(Transition::Step(S::Payment)),
        (S::Payment, E::ConfirmPayment) => {
            let option = form.payment_option.ok_or(CheckoutError::PaymentOptionRequired)?;
            if option.requires_receipt() && !form.receipt_attached {
                return Err(CheckoutError::ReceiptRequired);
            }
            Ok(Transition::Submit)
        }
        // Submission can start from either screen, so success is accepted
        // from both.
        (S::PaymentSelection | S::Payment, E::SubmissionSucceeded) => {
            Ok(Transition::Step(S::Confirmation))
        }
        (S::Payment, E::Back) => Ok(Transition::Step(S::PaymentSelection)),
        (S::PaymentSelection | S::Payment, E::EditOrderDetails) => {
            Ok(Transition::Step(S::CustomerInfo))
        }
        (S::Confirmation, E::ContinueShopping) => Ok(Transition::Reset),
        _ => Err(CheckoutError::InvalidTransition { from: step, event: event.name() }),
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckoutError {
    #[error("customer info is incomplete or invalid")]
    InvalidCustomerInfo(ValidationErrors),
    #[error("a payment option must be selected first")]
    PaymentOptionRequired,
    #[error("a payment receipt must be attached before confirming")]
    ReceiptRequired,
    #[error("unknown payment option: {0}")]
    UnknownPaymentOption(String),
    #[error("event {event} is not valid on step {from}")]
    InvalidTransition { from: CheckoutStep, event: &'static str },
}
