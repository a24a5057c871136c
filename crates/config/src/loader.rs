//! Configuration loader for agentpay
//!
//! Reads the JSON configuration file, applies environment overrides, and
//! attaches the API key from the environment.

use crate::config::{AgentConfig, ApiKey};
use agentpay_core::{
    Error, Result, AGENTPAY_AGENT_ID_VAR, AGENTPAY_API_KEY_VAR, AGENTPAY_API_URL_VAR,
    DEFAULT_CONFIG_FILENAME,
};
use std::path::{Path, PathBuf};

/// Configuration loader that handles startup configuration
pub struct ConfigLoader {
    /// Config file path (defaults to `agentpay.config.json` in the current directory)
    path: Option<PathBuf>,
    /// API key supplied by the caller instead of the environment
    api_key: Option<ApiKey>,
    /// Whether to consult environment variables
    read_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            path: None,
            api_key: None,
            read_env: true,
        }
    }

    /// Set the configuration file to load
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Use this API key instead of `AGENTPAY_API_KEY`
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Ignore environment overrides and secrets
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    /// Load the configuration
    pub fn load(self) -> Result<AgentConfig> {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));

        let contents = read_config_file(&path)?;
        let mut config = AgentConfig::from_json_str(&contents).map_err(|e| match e {
            Error::Json { message, source } => Error::Json {
                message: format!("{message} in '{}'", path.display()),
                source,
            },
            other => other,
        })?;

        if self.read_env {
            apply_env_overrides(&mut config)?;
        }

        config.api_key = match self.api_key {
            Some(key) => Some(key),
            None if self.read_env => api_key_from_env()?,
            None => None,
        };

        if config.api_key.is_none() {
            tracing::debug!(
                "{AGENTPAY_API_KEY_VAR} not set; requests will be sent without an API key"
            );
        }

        tracing::info!(
            agent_id = %config.agent_id,
            path = %path.display(),
            "configuration loaded"
        );

        Ok(config)
    }
}

fn read_config_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::file_system(path, "read config", e))
}

fn apply_env_overrides(config: &mut AgentConfig) -> Result<()> {
    let mut changed = false;
    if let Some(agent_id) = env_var(AGENTPAY_AGENT_ID_VAR)? {
        config.agent_id = agent_id;
        changed = true;
    }
    if let Some(api_url) = env_var(AGENTPAY_API_URL_VAR)? {
        config.api_url = api_url;
        changed = true;
    }
    if changed {
        config.validate()?;
    }
    Ok(())
}

fn api_key_from_env() -> Result<Option<ApiKey>> {
    match env_var(AGENTPAY_API_KEY_VAR)? {
        Some(value) => ApiKey::new(value)
            .map(Some)
            .map_err(|_| Error::environment(AGENTPAY_API_KEY_VAR, "is set but blank")),
        None => Ok(None),
    }
}

/// Read an optional variable, rejecting non-UTF-8 values
fn env_var(name: &str) -> Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => {
            Err(Error::environment(name, "contains invalid UTF-8"))
        }
    }
}
