/// Constants used throughout the agentpay codebase
// Environment variable names
pub const AGENTPAY_API_KEY_VAR: &str = "AGENTPAY_API_KEY";
pub const AGENTPAY_API_URL_VAR: &str = "AGENTPAY_API_URL";
pub const AGENTPAY_AGENT_ID_VAR: &str = "AGENTPAY_AGENT_ID";
pub const AGENTPAY_LOG_VAR: &str = "AGENTPAY_LOG";

// Configuration file
pub const DEFAULT_CONFIG_FILENAME: &str = "agentpay.config.json";

// Remote authority
pub const DEFAULT_API_URL: &str = "https://api.agentgatepay.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Mandate defaults
pub const DEFAULT_SCOPE: &str = "*";
pub const DEFAULT_TTL_MINUTES: u32 = 1440;

/// Minimum remaining budget, in cents, before a mandate is renewed.
pub const DEFAULT_RENEWAL_THRESHOLD_CENTS: u64 = 1;
