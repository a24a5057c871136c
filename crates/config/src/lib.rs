//! Configuration loading for agentpay
//!
//! Public settings come from a JSON file that is safe to commit; secrets come
//! only from the environment.

pub mod config;
pub mod loader;

#[cfg(test)]
mod config_tests;

pub use config::{AgentConfig, ApiKey};
pub use loader::ConfigLoader;
