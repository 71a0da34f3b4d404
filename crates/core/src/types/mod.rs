//! Type-safe wrappers for the values the checkout flow passes around.

mod id;
mod money;
mod payment;

pub use id::*;
pub use money::Money;
pub use payment::PaymentType;
