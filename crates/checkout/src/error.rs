//! Field-scoped validation errors.
//!
//! Validation failures are resolved locally: they block progression, name
//! the offending field so the UI can scope the message, and never reach the
//! network layer.

use thiserror::Error;

/// A client-side validation failure tied to a specific input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// The input field the failure is scoped to.
    pub field: &'static str,
    /// Human-readable message for that field.
    pub message: String,
}

impl ValidationError {
    /// Create a new field-scoped validation error.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
