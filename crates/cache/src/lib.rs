//! Mandate lifecycle management for agentpay
//!
//! This crate answers one question for any number of concurrent callers:
//! "give me a spending mandate that is neither expired nor exhausted".
//!
//! - **`store`**: `MandateCache`, the current record per subject
//! - **`policy`**: `RenewalPolicy`, the pure reuse/renew decision
//! - **`clock`**: injectable time source
//! - **`lifecycle`**: `MandateLifecycleManager`, which ties the above to a
//!   `RemoteMandateAuthority` with per-subject single-flight issuance
//! - **`config`**: mapping from `AgentConfig` to lifecycle defaults

pub mod clock;
pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod policy;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LifecycleConfig;
pub use errors::LifecycleError;
pub use lifecycle::MandateLifecycleManager;
pub use policy::{Decision, RenewReason, RenewalPolicy};
pub use store::MandateCache;
