//! Agent configuration
//!
//! `AgentConfig` is the single source of truth for an agent's identity and
//! mandate defaults. It is immutable after loading and cheap to clone.

use agentpay_core::{
    Amount, Error, IssuanceParams, Result, DEFAULT_API_URL, DEFAULT_RENEWAL_THRESHOLD_CENTS,
    DEFAULT_SCOPE, DEFAULT_TTL_MINUTES,
};
use chrono::Duration;
use serde::Deserialize;
use std::fmt;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// API key for the mandate authority. Zeroized on drop, redacted in `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create an API key, rejecting blank values
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let mut key = key.into();
        let end = key.trim_end().len();
        key.truncate(end);
        let start = key.len() - key.trim_start().len();
        key.drain(..start);
        if key.is_empty() {
            return Err(Error::validation("api_key", "must not be blank"));
        }
        Ok(Self(key))
    }

    /// Get the raw key for use in a request header
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Loaded agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Agent identity; also the mandate subject
    pub agent_id: String,

    /// Secret from `AGENTPAY_API_KEY`, never from the config file
    pub api_key: Option<ApiKey>,

    /// Base URL of the mandate authority
    pub api_url: String,

    /// Budget requested for each new mandate
    pub budget_usd: Amount,

    /// Scope requested for each new mandate
    pub scope: String,

    /// Lifetime requested for each new mandate
    pub ttl_minutes: u32,

    /// Remaining budget below which a mandate is renewed
    pub renewal_threshold_usd: Amount,

    /// Safety buffer subtracted from `expires_at` to absorb clock drift
    pub expiry_margin_seconds: u32,
}

/// On-disk shape of `agentpay.config.json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigFile {
    pub agent_id: String,
    pub budget_usd: Amount,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u32,
    #[serde(default)]
    pub renewal_threshold_usd: Option<Amount>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub expiry_margin_seconds: Option<u32>,
    /// Only read to refuse it
    #[serde(default)]
    pub api_key: Option<serde_json::Value>,
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_ttl_minutes() -> u32 {
    DEFAULT_TTL_MINUTES
}

impl AgentConfig {
    /// Create a configuration with defaults for everything but identity and budget
    pub fn new(agent_id: impl Into<String>, budget_usd: Amount) -> Result<Self> {
        let config = Self {
            agent_id: agent_id.into(),
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            budget_usd,
            scope: default_scope(),
            ttl_minutes: DEFAULT_TTL_MINUTES,
            renewal_threshold_usd: Amount::from_cents(DEFAULT_RENEWAL_THRESHOLD_CENTS),
            expiry_margin_seconds: 0,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse the public part of the configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json)
            .map_err(|e| Error::json("failed to parse agent configuration", e))?;
        Self::from_file(file)
    }

    pub(crate) fn from_file(file: ConfigFile) -> Result<Self> {
        if file.api_key.is_some() {
            return Err(Error::configuration(
                "apiKey must not be stored in the config file; set AGENTPAY_API_KEY instead",
            ));
        }

        let config = Self {
            agent_id: file.agent_id,
            api_key: None,
            api_url: file.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            budget_usd: file.budget_usd,
            scope: file.scope,
            ttl_minutes: file.ttl_minutes,
            renewal_threshold_usd: file
                .renewal_threshold_usd
                .unwrap_or_else(|| Amount::from_cents(DEFAULT_RENEWAL_THRESHOLD_CENTS)),
            expiry_margin_seconds: file.expiry_margin_seconds.unwrap_or(0),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants
    pub fn validate(&self) -> Result<()> {
        if self.agent_id.trim().is_empty() {
            return Err(Error::validation("agentId", "must not be empty"));
        }
        if self.scope.trim().is_empty() {
            return Err(Error::validation("scope", "must not be empty"));
        }
        if self.ttl_minutes == 0 {
            return Err(Error::validation("ttlMinutes", "must be at least 1"));
        }
        if self.renewal_threshold_usd > self.budget_usd {
            return Err(Error::validation(
                "renewalThresholdUsd",
                format!(
                    "{} exceeds budgetUsd {}; every mandate would renew immediately",
                    self.renewal_threshold_usd, self.budget_usd
                ),
            ));
        }
        if self.expiry_margin() >= self.ttl() {
            return Err(Error::validation(
                "expiryMarginSeconds",
                format!(
                    "{}s is not shorter than ttlMinutes {}; every mandate would renew immediately",
                    self.expiry_margin_seconds, self.ttl_minutes
                ),
            ));
        }
        let url = Url::parse(&self.api_url)
            .map_err(|e| Error::validation("apiUrl", format!("'{}': {e}", self.api_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation(
                "apiUrl",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::minutes(i64::from(self.ttl_minutes))
    }

    #[must_use]
    pub fn expiry_margin(&self) -> Duration {
        Duration::seconds(i64::from(self.expiry_margin_seconds))
    }

    /// Parameters for issuing a mandate with this configuration's defaults
    pub fn issuance_params(&self) -> Result<IssuanceParams> {
        IssuanceParams::new(self.budget_usd, self.scope.clone(), self.ttl())
    }
}
