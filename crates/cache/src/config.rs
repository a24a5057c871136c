//! Lifecycle defaults derived from agent configuration

use crate::policy::RenewalPolicy;
use agentpay_config::AgentConfig;
use agentpay_core::{IssuanceParams, Result};

/// Who to issue for, what to ask for, and when to renew
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Default subject for `ensure_default`
    pub subject: String,
    /// Default issuance request
    pub params: IssuanceParams,
    /// Renewal policy applied to every subject
    pub policy: RenewalPolicy,
}

impl LifecycleConfig {
    #[must_use]
    pub fn new(subject: impl Into<String>, params: IssuanceParams, policy: RenewalPolicy) -> Self {
        Self {
            subject: subject.into(),
            params,
            policy,
        }
    }

    /// Map `agentId`, `budgetUsd`, `scope`, `ttlMinutes`,
    /// `renewalThresholdUsd` and `expiryMarginSeconds` onto lifecycle settings
    pub fn from_agent_config(config: &AgentConfig) -> Result<Self> {
        let policy = RenewalPolicy::new(config.renewal_threshold_usd)
            .with_expiry_margin(config.expiry_margin());
        Ok(Self {
            subject: config.agent_id.clone(),
            params: config.issuance_params()?,
            policy,
        })
    }
}
