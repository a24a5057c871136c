//! Core domain types for `agentpay`.
//!
//! ## Organization
//!
//! - **`amount`**: the non-negative fixed-point `Amount` used for budgets
//! - **`mandate`**: the immutable `MandateRecord` and its `IssuanceParams`

pub mod amount;
pub mod mandate;

pub use amount::Amount;
pub use mandate::{IssuanceParams, MandateEnvelope, MandateRecord};
