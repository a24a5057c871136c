//! Library side of the `agentpay` binary
//!
//! Commands render their output to a `String` so they can be driven from
//! tests; `main` only prints.

pub mod commands;
pub mod context;

pub use commands::Commands;
pub use context::Context;
