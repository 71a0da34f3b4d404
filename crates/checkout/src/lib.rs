//! Mercato Checkout - checkout orchestration and cart synchronization.
//!
//! This crate is the client side of the platform's checkout flow. It keeps a
//! single source of truth for cart contents across independent UI surfaces,
//! manages the customer's address book, runs the three-step checkout wizard
//! (Address -> Payment -> Review), and reconciles hosted-gateway payments
//! after the external redirect returns.
//!
//! All business logic (pricing, inventory, payment capture, order
//! persistence) stays behind the remote API; this crate validates input,
//! sequences calls, and never recomputes backend-owned values.
//!
//! # Modules
//!
//! - [`config`] - environment-driven configuration
//! - [`api`] - authenticated, tenant-scoped HTTP client
//! - [`cart`] - cart snapshot fetching and cross-surface republishing
//! - [`address`] - address book CRUD and selection pointers
//! - [`payment`] - enabled payment method directory
//! - [`receipt`] - proof-of-payment upload pipeline
//! - [`wizard`] - the checkout state machine and submission branching
//! - [`verify`] - order confirmation after a gateway redirect

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod payment;
pub mod receipt;
pub mod verify;
pub mod wizard;

pub use address::{Address, AddressBook, AddressDraft, AddressError, AddressKind};
pub use api::{ApiClient, ApiError};
pub use cart::{CartBinder, CartError, CartSnapshot, CartState, LineItem};
pub use config::{ConfigError, StorefrontConfig};
pub use error::ValidationError;
pub use payment::{PaymentMethod, PaymentMethodDirectory};
pub use receipt::{ReceiptFile, ReceiptUpload, ReceiptUploader, UploadError};
pub use verify::{ConfirmedOrder, OrderConfirmationVerifier, ReturnParams, VerificationError};
pub use wizard::{CheckoutWizard, Step, SubmitOutcome, WizardError};
