//! Payment method directory.
//!
//! The set of enabled payment methods is immutable for the session, so it
//! is fetched once and memoized. The `payment_type` on each method is what
//! drives the wizard's submission branching.

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::instrument;

use mercato_core::{PaymentMethodId, PaymentType};

use crate::api::{ApiClient, ApiError};

const METHODS_ENDPOINT: &str = "public/get-paymentmethod";

/// An enabled payment method.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub payment_type: PaymentType,
}

#[derive(Debug, Deserialize)]
struct MethodsEnvelope {
    data: Vec<PaymentMethod>,
}

/// Read-only list of enabled payment methods, fetched once per session.
pub struct PaymentMethodDirectory {
    api: ApiClient,
    methods: OnceCell<Vec<PaymentMethod>>,
}

impl PaymentMethodDirectory {
    /// Create a new directory over the given API client.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            methods: OnceCell::new(),
        }
    }

    /// The enabled payment methods.
    ///
    /// The first call fetches; later calls return the memoized list.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial fetch fails. A failed fetch is not
    /// memoized, so the next call retries.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<&[PaymentMethod], ApiError> {
        let methods = self
            .methods
            .get_or_try_init(|| async {
                let envelope: MethodsEnvelope = self.api.get(METHODS_ENDPOINT).await?;
                Ok::<_, ApiError>(envelope.data)
            })
            .await?;
        Ok(methods.as_slice())
    }

    /// Look up a method by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial fetch fails.
    pub async fn find(&self, id: PaymentMethodId) -> Result<Option<&PaymentMethod>, ApiError> {
        Ok(self.list().await?.iter().find(|m| m.id == id))
    }

    /// The default method: the first enabled entry, if any.
    ///
    /// The wizard falls back to this when the customer has not chosen yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial fetch fails.
    pub async fn default_method(&self) -> Result<Option<&PaymentMethod>, ApiError> {
        Ok(self.list().await?.first())
    }
}
