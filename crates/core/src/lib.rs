//! Core domain types, errors, and constants for `agentpay`.
//!
//! This crate holds the building blocks every other workspace crate speaks:
//!
//! - **`errors`**: the crate-wide `Error` enum and `Result` alias.
//! - **`types`**: the `Amount` fixed-point newtype, the immutable
//!   `MandateRecord`, and `IssuanceParams`.
//! - **`authority`**: the `RemoteMandateAuthority` seam and the
//!   `AuthorityError` it reports.
//! - **`constants`**: environment variable names and defaults.

pub mod authority;
pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    authority::{AuthorityError, RemoteMandateAuthority},
    constants::*,
    errors::{Error, Result},
    types::*,
};
