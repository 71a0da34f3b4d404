//! Order confirmation after a hosted-gateway redirect.
//!
//! When the gateway sends the customer back, the application re-enters at
//! the confirmation route carrying `session_id` and `order_id` as query
//! parameters. Verification is a server-side check of the completed
//! session; it is never attempted with partial identifiers - a missing one
//! is a hard error, not a loading state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use mercato_core::{Money, OrderId};

use crate::api::{ApiClient, ApiError};

const VERIFY_ENDPOINT: &str = "checkout/verify-stripe-order";

/// Verification failures.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The return redirect carried no `session_id`.
    #[error("missing session_id in return url")]
    MissingSessionId,

    /// The return redirect carried no `order_id`.
    #[error("missing order_id in return url")]
    MissingOrderId,

    /// The `order_id` query parameter is not a number.
    #[error("invalid order_id in return url: {0}")]
    InvalidOrderId(String),

    /// The verification call failed at the API boundary.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The backend could not confirm the transaction.
    #[error("verification rejected: {0}")]
    Rejected(String),
}

/// Identifiers carried on the gateway's return redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnParams {
    pub session_id: String,
    pub order_id: OrderId,
}

impl ReturnParams {
    /// Parse the confirmation route URL.
    ///
    /// # Errors
    ///
    /// Returns a hard error when either identifier is missing, empty, or
    /// malformed. No network call is ever made with partial identifiers.
    pub fn from_url(url: &Url) -> Result<Self, VerificationError> {
        let mut session_id = None;
        let mut order_id = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "session_id" => session_id = Some(value.into_owned()),
                "order_id" => order_id = Some(value.into_owned()),
                _ => {}
            }
        }

        let session_id = session_id
            .filter(|s| !s.is_empty())
            .ok_or(VerificationError::MissingSessionId)?;
        let raw_order_id = order_id
            .filter(|s| !s.is_empty())
            .ok_or(VerificationError::MissingOrderId)?;
        let order_id = raw_order_id
            .parse::<i64>()
            .map(OrderId::new)
            .map_err(|_| VerificationError::InvalidOrderId(raw_order_id))?;

        Ok(Self {
            session_id,
            order_id,
        })
    }
}

/// A line item on a confirmed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfirmedItem {
    pub id: i64,
    pub name: String,
    pub quantity: u32,
    pub price: Money,
}

/// Shipping address on a confirmed order, as the backend renders it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfirmedShippingAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
}

/// The verified order, as confirmed server-side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfirmedOrder {
    pub id: OrderId,
    pub total: Money,
    pub payment_status: String,
    #[serde(default)]
    pub items: Vec<ConfirmedItem>,
    #[serde(default)]
    pub shipping_address: Option<ConfirmedShippingAddress>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    session_id: &'a str,
    order_id: OrderId,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    order: Option<ConfirmedOrder>,
}

/// Verifies completed gateway sessions on re-entry.
#[derive(Clone)]
pub struct OrderConfirmationVerifier {
    api: ApiClient,
}

impl OrderConfirmationVerifier {
    /// Create a new verifier over the given API client.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Verify the completed session and fetch the confirmed order.
    ///
    /// Retrying after a failure re-invokes this with the same params; that
    /// is distinct from starting the checkout over.
    ///
    /// # Errors
    ///
    /// Returns an API error, or `Rejected` when the backend answers with a
    /// non-success result.
    #[instrument(skip(self), fields(order_id = %params.order_id))]
    pub async fn verify(&self, params: &ReturnParams) -> Result<ConfirmedOrder, VerificationError> {
        let request = VerifyRequest {
            session_id: &params.session_id,
            order_id: params.order_id,
        };
        let response: VerifyResponse = self.api.post(VERIFY_ENDPOINT, &request).await?;

        if !response.success {
            return Err(VerificationError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "order verification failed".to_string()),
            ));
        }
        response.order.ok_or_else(|| {
            VerificationError::Rejected("verification succeeded without order details".to_string())
        })
    }
}
