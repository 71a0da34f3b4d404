//! Address book management.
//!
//! CRUD over the customer's saved billing/shipping addresses plus the
//! session-scoped "currently selected" pointer per kind. Selections are
//! in-memory only - they are not persisted fields on the address itself.
//!
//! Mutations re-fetch the whole list rather than merging optimistically, so
//! the client never diverges from server-assigned ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use mercato_core::AddressId;

use crate::api::{Ack, ApiClient, ApiError};
use crate::error::ValidationError;

const LIST_ENDPOINT: &str = "get-my-address";
const CREATE_ENDPOINT: &str = "add-my-address";

/// Which side of the order an address applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Billing,
    Shipping,
}

/// A saved customer address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub physical_address: String,
    pub city: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or updating an address.
#[derive(Debug, Clone, Serialize)]
pub struct AddressDraft {
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub physical_address: String,
    pub city: String,
    pub country: String,
}

impl AddressDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.physical_address.trim().is_empty() {
            return Err(ValidationError::new(
                "physical_address",
                "physical address is required",
            ));
        }
        if self.city.trim().is_empty() {
            return Err(ValidationError::new("city", "city is required"));
        }
        if self.country.trim().is_empty() {
            return Err(ValidationError::new("country", "country is required"));
        }
        Ok(())
    }
}

/// Address book failures.
#[derive(Debug, Error)]
pub enum AddressError {
    /// Draft validation failed; no network call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The last remaining address cannot be deleted.
    #[error("cannot delete the last remaining address")]
    LastAddress,

    /// The id does not refer to a known address.
    #[error("unknown address: {0}")]
    UnknownAddress(AddressId),

    /// API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Deserialize)]
struct AddressListEnvelope {
    data: Vec<Address>,
}

/// The customer's saved addresses and the active selection per kind.
pub struct AddressBook {
    api: ApiClient,
    entries: Vec<Address>,
    selected_billing: Option<AddressId>,
    selected_shipping: Option<AddressId>,
}

impl AddressBook {
    /// Create an empty, unloaded address book.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            entries: Vec::new(),
            selected_billing: None,
            selected_shipping: None,
        }
    }

    /// Fetch the address book from the backend.
    ///
    /// Auto-selects the first address of each kind, but only when no
    /// selection is active - an explicit user choice is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<(), AddressError> {
        let envelope: AddressListEnvelope = self.api.get(LIST_ENDPOINT).await?;
        self.entries = envelope.data;
        self.ensure_selections();
        Ok(())
    }

    /// All saved addresses.
    #[must_use]
    pub fn all(&self) -> &[Address] {
        &self.entries
    }

    /// Saved billing addresses.
    #[must_use]
    pub fn billing(&self) -> Vec<&Address> {
        self.of_kind(AddressKind::Billing)
    }

    /// Saved shipping addresses.
    #[must_use]
    pub fn shipping(&self) -> Vec<&Address> {
        self.of_kind(AddressKind::Shipping)
    }

    /// The currently selected billing address, if any.
    #[must_use]
    pub fn selected_billing(&self) -> Option<&Address> {
        self.selected_billing.and_then(|id| self.find(id))
    }

    /// The currently selected shipping address, if any.
    #[must_use]
    pub fn selected_shipping(&self) -> Option<&Address> {
        self.selected_shipping.and_then(|id| self.find(id))
    }

    /// Select a billing address explicitly.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAddress` if the id is not a saved billing address.
    pub fn select_billing(&mut self, id: AddressId) -> Result<(), AddressError> {
        self.check_kind(id, AddressKind::Billing)?;
        self.selected_billing = Some(id);
        Ok(())
    }

    /// Select a shipping address explicitly.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAddress` if the id is not a saved shipping address.
    pub fn select_shipping(&mut self, id: AddressId) -> Result<(), AddressError> {
        self.check_kind(id, AddressKind::Shipping)?;
        self.selected_shipping = Some(id);
        Ok(())
    }

    /// Create a new address.
    ///
    /// On success the whole list is re-fetched; server-assigned ids are
    /// never guessed client-side.
    ///
    /// # Errors
    ///
    /// Returns a field-scoped validation error (before any network call) or
    /// an API error.
    #[instrument(skip(self, draft))]
    pub async fn create(&mut self, draft: AddressDraft) -> Result<(), AddressError> {
        draft.validate()?;
        let ack: Ack = self.api.post(CREATE_ENDPOINT, &draft).await?;
        ack.into_result()?;
        self.load().await
    }

    /// Update an existing address in place, reusing its id.
    ///
    /// # Errors
    ///
    /// Returns a field-scoped validation error, `UnknownAddress`, or an API
    /// error.
    #[instrument(skip(self, draft), fields(id = %id))]
    pub async fn update(&mut self, id: AddressId, draft: AddressDraft) -> Result<(), AddressError> {
        draft.validate()?;
        if self.find(id).is_none() {
            return Err(AddressError::UnknownAddress(id));
        }
        let ack: Ack = self
            .api
            .put(&format!("update-my-address/{id}"), &draft)
            .await?;
        ack.into_result()?;
        self.load().await
    }

    /// Delete a single address.
    ///
    /// Refused while the book holds exactly one address. When the deleted
    /// id was the active selection for its kind, selection falls back to
    /// the next available address of that kind, or clears if none remain.
    ///
    /// # Errors
    ///
    /// Returns `LastAddress` (book unchanged, no network call),
    /// `UnknownAddress`, or an API error.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_one(&mut self, id: AddressId) -> Result<(), AddressError> {
        if self.find(id).is_none() {
            return Err(AddressError::UnknownAddress(id));
        }
        if self.entries.len() == 1 {
            return Err(AddressError::LastAddress);
        }
        let ack: Ack = self.api.delete(&format!("remove-my-address/{id}")).await?;
        ack.into_result()?;
        self.load().await
    }

    /// Delete every saved address and clear both selections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    #[instrument(skip(self))]
    pub async fn delete_all(&mut self) -> Result<(), AddressError> {
        let ack: Ack = self.api.delete("remove-my-address").await?;
        ack.into_result()?;
        self.entries.clear();
        self.selected_billing = None;
        self.selected_shipping = None;
        Ok(())
    }

    fn of_kind(&self, kind: AddressKind) -> Vec<&Address> {
        self.entries.iter().filter(|a| a.kind == kind).collect()
    }

    fn find(&self, id: AddressId) -> Option<&Address> {
        self.entries.iter().find(|a| a.id == id)
    }

    fn check_kind(&self, id: AddressId, kind: AddressKind) -> Result<(), AddressError> {
        match self.find(id) {
            Some(address) if address.kind == kind => Ok(()),
            _ => Err(AddressError::UnknownAddress(id)),
        }
    }

    /// Drop selections whose address no longer exists, then fill empty
    /// selections with the first address of the matching kind.
    fn ensure_selections(&mut self) {
        if let Some(id) = self.selected_billing
            && self.find(id).is_none()
        {
            self.selected_billing = None;
        }
        if let Some(id) = self.selected_shipping
            && self.find(id).is_none()
        {
            self.selected_shipping = None;
        }
        if self.selected_billing.is_none() {
            self.selected_billing = self.first_of(AddressKind::Billing);
        }
        if self.selected_shipping.is_none() {
            self.selected_shipping = self.first_of(AddressKind::Shipping);
        }
    }

    fn first_of(&self, kind: AddressKind) -> Option<AddressId> {
        self.entries.iter().find(|a| a.kind == kind).map(|a| a.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::StorefrontConfig;

    fn api() -> ApiClient {
        let config = StorefrontConfig::for_session(
            "https://shop.example.com/api",
            "token-value",
            "tenant-a",
            "en",
        );
        ApiClient::new(&config).unwrap()
    }

    fn address(id: i64, kind: AddressKind) -> Address {
        Address {
            id: AddressId::new(id),
            kind,
            physical_address: format!("{id} Main St"),
            city: "Addis Ababa".to_string(),
            country: "ET".to_string(),
            created_at: "2026-01-10T08:00:00Z".parse().unwrap(),
        }
    }

    fn book_with(entries: Vec<Address>) -> AddressBook {
        let mut book = AddressBook::new(api());
        book.entries = entries;
        book
    }

    #[test]
    fn test_draft_validation_is_field_scoped() {
        let draft = AddressDraft {
            kind: AddressKind::Billing,
            physical_address: "1 Main St".to_string(),
            city: "  ".to_string(),
            country: "ET".to_string(),
        };
        let err = draft.validate().unwrap_err();
        assert_eq!(err.field, "city");
    }

    #[test]
    fn test_auto_select_first_of_each_kind() {
        let mut book = book_with(vec![
            address(1, AddressKind::Billing),
            address(2, AddressKind::Billing),
            address(3, AddressKind::Shipping),
        ]);
        book.ensure_selections();

        assert_eq!(book.selected_billing().unwrap().id, AddressId::new(1));
        assert_eq!(book.selected_shipping().unwrap().id, AddressId::new(3));
    }

    #[test]
    fn test_auto_select_never_overwrites_explicit_choice() {
        let mut book = book_with(vec![
            address(1, AddressKind::Billing),
            address(2, AddressKind::Billing),
        ]);
        book.select_billing(AddressId::new(2)).unwrap();
        book.ensure_selections();

        assert_eq!(book.selected_billing().unwrap().id, AddressId::new(2));
    }

    #[test]
    fn test_selection_falls_back_when_address_disappears() {
        let mut book = book_with(vec![
            address(1, AddressKind::Shipping),
            address(2, AddressKind::Shipping),
        ]);
        book.select_shipping(AddressId::new(2)).unwrap();

        // Simulate a re-fetch that no longer contains address 2
        book.entries = vec![address(1, AddressKind::Shipping)];
        book.ensure_selections();

        assert_eq!(book.selected_shipping().unwrap().id, AddressId::new(1));
    }

    #[test]
    fn test_selection_clears_when_kind_is_exhausted() {
        let mut book = book_with(vec![address(1, AddressKind::Shipping)]);
        book.ensure_selections();
        book.entries.clear();
        book.ensure_selections();

        assert!(book.selected_shipping().is_none());
    }

    #[test]
    fn test_select_rejects_kind_mismatch() {
        let mut book = book_with(vec![address(1, AddressKind::Billing)]);
        let err = book.select_shipping(AddressId::new(1)).unwrap_err();
        assert!(matches!(err, AddressError::UnknownAddress(_)));
    }

    #[tokio::test]
    async fn test_create_with_invalid_draft_skips_network() {
        // No server is listening; a network attempt would error with
        // ApiError, not ValidationError.
        let mut book = book_with(vec![]);
        let draft = AddressDraft {
            kind: AddressKind::Billing,
            physical_address: String::new(),
            city: "Addis Ababa".to_string(),
            country: "ET".to_string(),
        };
        let err = book.create(draft).await.unwrap_err();
        assert!(matches!(err, AddressError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_sole_address_is_rejected_without_network() {
        let mut book = book_with(vec![address(1, AddressKind::Billing)]);
        let err = book.delete_one(AddressId::new(1)).await.unwrap_err();
        assert!(matches!(err, AddressError::LastAddress));
        assert_eq!(book.all().len(), 1);
    }
}
