//! Checkout flow orchestration.
//!
//! Owns the cart, the form, the attached receipt and the current step,
//! and drives the [`transition`] function. Submission happens through the
//! [`SubmitOrder`] seam; the step only advances to the confirmation
//! screen once the pipeline reports success.

use rust_decimal::Decimal;
use tracing::error;

use crate::checkout::client::{SubmitError, SubmitOrder, SubmitSuccess};
use crate::checkout::payload::build_order_payload;
use crate::checkout::receipt::ReceiptAttachment;
use crate::domain::aggregates::cart::Cart;
use crate::domain::aggregates::checkout::{
    transition, CheckoutError, CheckoutEvent, CheckoutForm, CheckoutStep, PaymentOption, Transition,
};
use crate::domain::value_objects::OrderId;

/// What the terminal screen shows.
#[derive(Clone, Debug)]
pub struct Confirmation {
    pub order_id: OrderId,
    pub total: Decimal,
    pub receipt_url: Option<String>,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
    #[error(transparent)]
    Submission(#[from] SubmitError),
}

pub struct CheckoutFlow<S> {
    step: CheckoutStep,
    form: CheckoutForm,
    cart: Cart,
    receipt: Option<ReceiptAttachment>,
    confirmation: Option<Confirmation>,
    submitter: S,
}

impl<S: SubmitOrder> CheckoutFlow<S> {
    pub fn new(cart: Cart, submitter: S) -> Self {
        Self {
            step: CheckoutStep::CustomerInfo,
            form: CheckoutForm::default(),
            cart,
            receipt: None,
            confirmation: None,
            submitter,
        }
    }

    pub fn step(&self) -> CheckoutStep { self.step }
    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn form(&self) -> &CheckoutForm { &self.form }
    pub fn form_mut(&mut self) -> &mut CheckoutForm { &mut self.form }
    pub fn confirmation(&self) -> Option<&Confirmation> { self.confirmation.as_ref() }
    pub fn receipt(&self) -> Option<&ReceiptAttachment> { self.receipt.as_ref() }

    pub fn attach_receipt(&mut self, receipt: ReceiptAttachment) {
        self.form.receipt_attached = true;
        self.receipt = Some(receipt);
    }

    pub fn remove_receipt(&mut self) {
        self.form.receipt_attached = false;
        self.receipt = None;
    }

    /// Leave the customer-info form. Blocked until the form validates.
    pub fn continue_to_payment(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.apply_step(&CheckoutEvent::ContinueToPayment)
    }

    /// Pick a payment option. Cash on delivery submits straight away and
    /// lands on the confirmation screen without a payment step.
    pub async fn select_payment(&mut self, option: PaymentOption) -> Result<CheckoutStep, FlowError> {
        self.form.payment_option = Some(option);
        match transition(self.step, &CheckoutEvent::SelectPayment(option), &self.form)? {
            Transition::Step(next) => {
                self.step = next;
                Ok(next)
            }
            Transition::Submit => self.submit().await,
            Transition::Reset => unreachable!("selecting payment never resets"),
        }
    }

    /// Confirm on the payment screen; receipt-backed options must have an
    /// attachment by now.
    pub async fn confirm_payment(&mut self) -> Result<CheckoutStep, FlowError> {
        match transition(self.step, &CheckoutEvent::ConfirmPayment, &self.form)? {
            Transition::Submit => self.submit().await,
            Transition::Step(next) => {
                self.step = next;
                Ok(next)
            }
            Transition::Reset => unreachable!("confirming payment never resets"),
        }
    }

    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.apply_step(&CheckoutEvent::Back)
    }

    pub fn edit_order_details(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.apply_step(&CheckoutEvent::EditOrderDetails)
    }

    /// Leave the confirmation screen: clears the cart and every piece of
    /// checkout state.
    pub fn continue_shopping(&mut self) -> Result<CheckoutStep, CheckoutError> {
        match transition(self.step, &CheckoutEvent::ContinueShopping, &self.form)? {
            Transition::Reset => {
                self.cart.clear();
                self.form = CheckoutForm::default();
                self.receipt = None;
                self.confirmation = None;
                self.step = CheckoutStep::CustomerInfo;
                Ok(self.step)
            }
            _ => unreachable!("continue shopping only resets"),
        }
    }

    async fn submit(&mut self) -> Result<CheckoutStep, FlowError> {
        let option = self.form.payment_option.ok_or(CheckoutError::PaymentOptionRequired)?;
        let receiver = self.form.ship_to_different_address.then(|| self.form.receiver.clone());
        let payload = build_order_payload(
            &self.form.customer,
            receiver.as_ref(),
            &self.cart,
            option,
            self.receipt.as_ref(),
        );

        let SubmitSuccess { order_id, receipt_url, message, .. } =
            match self.submitter.submit(&payload).await {
                Ok(success) => success,
                Err(err) => {
                    // Stay on the current step; the caller surfaces the
                    // message and the customer may try again.
                    error!(step = %self.step, error = %err, "order submission failed");
                    return Err(err.into());
                }
            };

        match transition(self.step, &CheckoutEvent::SubmissionSucceeded, &self.form)? {
            Transition::Step(next) => {
                self.step = next;
                self.confirmation = Some(Confirmation {
                    order_id,
                    total: payload.total,
                    receipt_url,
                    message,
                });
                Ok(next)
            }
            _ => unreachable!("submission success always advances a step"),
        }
    }

    fn apply_step(&mut self, event: &CheckoutEvent) -> Result<CheckoutStep, CheckoutError> {
        match transition(self.step, event, &self.form)? {
            Transition::Step(next) => {
                self.step = next;
                Ok(next)
            }
            _ => unreachable!("navigation events only move between steps"),
        }
    }
}
