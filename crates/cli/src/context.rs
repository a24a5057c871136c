use agentpay_cache::{LifecycleConfig, MandateLifecycleManager};
use agentpay_client::HttpAuthority;
use agentpay_config::{AgentConfig, ConfigLoader};
use agentpay_core::RemoteMandateAuthority;
use eyre::WrapErr;
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs: configuration, the authority client, and a
/// lifecycle manager wired to both.
pub struct Context {
    config: AgentConfig,
    authority: Arc<HttpAuthority>,
    manager: MandateLifecycleManager,
}

impl Context {
    /// Load the configuration at `path` (plus environment) and build the context
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let config = ConfigLoader::new()
            .path(path)
            .load()
            .wrap_err_with(|| format!("failed to load configuration from {}", path.display()))?;
        Self::new(config)
    }

    pub fn new(config: AgentConfig) -> eyre::Result<Self> {
        let authority = Arc::new(HttpAuthority::from_config(&config)?);
        let lifecycle = LifecycleConfig::from_agent_config(&config)?;
        let manager = MandateLifecycleManager::new(
            Arc::clone(&authority) as Arc<dyn RemoteMandateAuthority>,
            lifecycle,
        );
        Ok(Self {
            config,
            authority,
            manager,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn authority(&self) -> &HttpAuthority {
        &self.authority
    }

    pub fn manager(&self) -> &MandateLifecycleManager {
        &self.manager
    }
}
