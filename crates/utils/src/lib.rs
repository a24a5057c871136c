//! Shared utilities for agentpay
//!
//! Tracing setup for binaries and helpers for keeping credentials out of
//! logs and terminal output.

pub mod logging;
pub mod redact;

pub use self::logging::*;
pub use self::redact::*;
