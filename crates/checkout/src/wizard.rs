//! The checkout wizard state machine.
//!
//! Three gated steps (Address -> Payment -> Review) and a terminal
//! `Submitted` state. Transitions move forward or backward one step at a
//! time; each forward transition runs that step's validation gate, so a
//! session can never reach a later step with an impossible combination of
//! inputs (say, Review with no payment method).
//!
//! Submission is dispatched down exactly one of two paths, chosen solely by
//! the selected method's [`PaymentType`]: hosted-gateway session creation,
//! or direct order processing for cash and bank-transfer payments.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use mercato_core::{AddressId, OrderId, PaymentMethodId, PaymentType};

use crate::api::{ApiClient, ApiError};
use crate::error::ValidationError;
use crate::payment::PaymentMethod;
use crate::receipt::ReceiptUpload;

const SESSION_ENDPOINT: &str = "checkout/session";
const PROCESS_ENDPOINT: &str = "checkout/process";

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Step 1: billing/shipping address selection.
    Address,
    /// Step 2: payment method selection (and receipt upload for bank).
    Payment,
    /// Step 3: review and submission.
    Review,
    /// Terminal: the order was placed.
    Submitted,
}

/// In-memory checkout state.
///
/// Created when the customer enters checkout, destroyed on successful
/// placement or navigation away. Nothing here is persisted.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    step: Step,
    billing_address: Option<AddressId>,
    shipping_address: Option<AddressId>,
    ship_to_billing: bool,
    payment_method: Option<PaymentMethod>,
    notes: Option<String>,
    receipt: Option<ReceiptUpload>,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self {
            step: Step::Address,
            billing_address: None,
            shipping_address: None,
            ship_to_billing: true,
            payment_method: None,
            notes: None,
            receipt: None,
        }
    }
}

/// Wizard failures.
#[derive(Debug, Error)]
pub enum WizardError {
    /// A step gate failed; the step does not advance.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// There is no step after the current one.
    #[error("no step after the current one; the review step is left via submission")]
    NoNextStep,

    /// There is no step before the current one.
    #[error("no step before the current one")]
    NoPreviousStep,

    /// Submission was attempted away from the review step.
    #[error("submission is only possible from the review step")]
    NotAtReview,

    /// A submission is already in flight; the trigger stays disabled until
    /// it resolves.
    #[error("a submission is already in flight")]
    SubmissionInFlight,

    /// The gateway session carried neither a completion nor a redirect
    /// target.
    #[error("gateway session returned no redirect target")]
    Gateway,

    /// Submission failed at the API boundary. The step stays at Review and
    /// all entered data is retained.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The order was placed; the wizard is now at `Submitted`.
    Placed { order_id: OrderId },
    /// Control leaves the application for the hosted payment page. The
    /// gateway later redirects back to the confirmation route.
    Redirect(Url),
}

/// The three-step checkout flow.
pub struct CheckoutWizard {
    api: ApiClient,
    session: CheckoutSession,
    submitting: bool,
}

impl CheckoutWizard {
    /// Start a fresh checkout session.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            session: CheckoutSession::default(),
            submitting: false,
        }
    }

    /// The current step.
    #[must_use]
    pub const fn step(&self) -> Step {
        self.session.step
    }

    /// Whether a submission is currently in flight (the submit trigger
    /// should be rendered disabled).
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// The selected payment method, if any.
    #[must_use]
    pub const fn payment_method(&self) -> Option<&PaymentMethod> {
        self.session.payment_method.as_ref()
    }

    /// The attached receipt, if any.
    #[must_use]
    pub const fn receipt(&self) -> Option<&ReceiptUpload> {
        self.session.receipt.as_ref()
    }

    pub fn select_billing_address(&mut self, id: AddressId) {
        self.session.billing_address = Some(id);
    }

    pub fn select_shipping_address(&mut self, id: AddressId) {
        self.session.shipping_address = Some(id);
    }

    pub fn set_ship_to_billing(&mut self, ship_to_billing: bool) {
        self.session.ship_to_billing = ship_to_billing;
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.session.payment_method = Some(method);
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.session.notes = Some(notes.into());
    }

    /// Attach a successfully uploaded receipt (bank transfers only).
    pub fn attach_receipt(&mut self, receipt: ReceiptUpload) {
        self.session.receipt = Some(receipt);
    }

    pub fn clear_receipt(&mut self) {
        self.session.receipt = None;
    }

    /// Advance one step, running the current step's validation gate.
    ///
    /// # Errors
    ///
    /// Returns a field-scoped validation error (step unchanged) or
    /// `NoNextStep` past the payment step.
    pub fn next(&mut self) -> Result<Step, WizardError> {
        let next = match self.session.step {
            Step::Address => {
                self.validate_address_step()?;
                Step::Payment
            }
            Step::Payment => {
                self.validate_payment_step()?;
                Step::Review
            }
            Step::Review | Step::Submitted => return Err(WizardError::NoNextStep),
        };
        self.session.step = next;
        Ok(next)
    }

    /// Go back one step. Entered data is retained.
    ///
    /// # Errors
    ///
    /// Returns `NoPreviousStep` at the address step or after submission.
    pub fn back(&mut self) -> Result<Step, WizardError> {
        let previous = match self.session.step {
            Step::Payment => Step::Address,
            Step::Review => Step::Payment,
            Step::Address | Step::Submitted => return Err(WizardError::NoPreviousStep),
        };
        self.session.step = previous;
        Ok(previous)
    }

    /// Submit the order. Exactly one network call is made, selected by the
    /// payment method's type.
    ///
    /// On failure the step stays at Review, the in-flight flag clears so
    /// the trigger re-enables, and every entered value is retained.
    ///
    /// # Errors
    ///
    /// Returns `NotAtReview`, `SubmissionInFlight`, a validation error from
    /// the defensive payment-gate re-check, or an API/gateway error.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Result<SubmitOutcome, WizardError> {
        if self.session.step != Step::Review {
            return Err(WizardError::NotAtReview);
        }
        if self.submitting {
            return Err(WizardError::SubmissionInFlight);
        }

        // Defensive re-check of the payment gate before dispatch
        self.validate_payment_step()?;
        let Some(method) = self.session.payment_method.clone() else {
            return Err(ValidationError::new("payment_method", "select a payment method").into());
        };

        self.submitting = true;
        let result = match method.payment_type {
            PaymentType::Gateway => self.submit_gateway(&method).await,
            PaymentType::Cash | PaymentType::Bank => self.submit_direct(&method).await,
        };
        self.submitting = false;

        if let Ok(SubmitOutcome::Placed { .. }) = &result {
            self.session.step = Step::Submitted;
        }
        result
    }

    async fn submit_gateway(&self, method: &PaymentMethod) -> Result<SubmitOutcome, WizardError> {
        let payload = self.payload(method)?;
        let response: SessionResponse = self.api.post(SESSION_ENDPOINT, &payload).await?;

        // Cash-equivalent fallback: the backend completed the order without
        // a hosted page.
        if response.completed
            && let Some(order_id) = response.order_id
        {
            return Ok(SubmitOutcome::Placed { order_id });
        }

        if let Some(raw) = response.url {
            let url = Url::parse(&raw)
                .map_err(|e| ApiError::Parse(format!("invalid redirect url: {e}")))?;
            return Ok(SubmitOutcome::Redirect(url));
        }

        // A bare session id is unusable here: the hosted page URL is
        // gateway-private and must come from the backend.
        Err(WizardError::Gateway)
    }

    async fn submit_direct(&self, method: &PaymentMethod) -> Result<SubmitOutcome, WizardError> {
        let payload = self.payload(method)?;
        let response: ProcessResponse = self.api.post(PROCESS_ENDPOINT, &payload).await?;
        Ok(SubmitOutcome::Placed {
            order_id: response.order_id,
        })
    }

    fn payload(&self, method: &PaymentMethod) -> Result<SubmissionPayload<'_>, WizardError> {
        let billing = self
            .session
            .billing_address
            .ok_or_else(|| ValidationError::new("billing_address", "select a billing address"))?;
        let shipping = if self.session.ship_to_billing {
            billing
        } else {
            self.session.shipping_address.ok_or_else(|| {
                ValidationError::new("shipping_address", "select a shipping address")
            })?
        };
        let receipt = if method.payment_type == PaymentType::Bank {
            let upload = self
                .session
                .receipt
                .as_ref()
                .ok_or_else(|| ValidationError::new("receipt", "upload a payment receipt"))?;
            Some(upload.stored_filename.as_str())
        } else {
            None
        };

        Ok(SubmissionPayload {
            payment_method_id: method.id,
            billing_address_id: billing,
            shipping_address_id: shipping,
            notes: self.session.notes.as_deref(),
            receipt,
        })
    }

    fn validate_address_step(&self) -> Result<(), ValidationError> {
        if self.session.billing_address.is_none() {
            return Err(ValidationError::new(
                "billing_address",
                "select a billing address",
            ));
        }
        if !self.session.ship_to_billing && self.session.shipping_address.is_none() {
            return Err(ValidationError::new(
                "shipping_address",
                "select a shipping address",
            ));
        }
        Ok(())
    }

    fn validate_payment_step(&self) -> Result<(), ValidationError> {
        let Some(method) = &self.session.payment_method else {
            return Err(ValidationError::new(
                "payment_method",
                "select a payment method",
            ));
        };
        if method.payment_type == PaymentType::Bank {
            match &self.session.receipt {
                Some(receipt) if !receipt.stored_filename.is_empty() => {}
                _ => return Err(ValidationError::new("receipt", "upload a payment receipt")),
            }
        }
        Ok(())
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Serialize)]
struct SubmissionPayload<'a> {
    payment_method_id: PaymentMethodId,
    billing_address_id: AddressId,
    shipping_address_id: AddressId,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    order_id: Option<OrderId>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    order_id: OrderId,
}
