//! Mercato Core - Shared types library.
//!
//! Common types used across the Mercato checkout workspace:
//! - `checkout` - Checkout orchestration and cart synchronization client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money amounts, and the
//!   payment-type enumeration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
