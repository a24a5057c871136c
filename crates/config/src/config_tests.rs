//! Unit tests for configuration parsing and loading

#[cfg(test)]
mod tests {
    use crate::{AgentConfig, ApiKey, ConfigLoader};
    use agentpay_core::{
        Amount, Error, AGENTPAY_AGENT_ID_VAR, AGENTPAY_API_KEY_VAR, AGENTPAY_API_URL_VAR,
        DEFAULT_API_URL,
    };
    use serial_test::serial;
    use std::fs;
    use std::str::FromStr;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "agentId": "my-ai-agent",
        "budgetUsd": 100,
        "scope": "*",
        "ttlMinutes": 1440,
        "renewalThresholdUsd": "0.01"
    }"#;

    fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("agentpay.config.json");
        fs::write(&path, contents).unwrap();
        path
    }

    fn clear_env() {
        std::env::remove_var(AGENTPAY_API_KEY_VAR);
        std::env::remove_var(AGENTPAY_AGENT_ID_VAR);
        std::env::remove_var(AGENTPAY_API_URL_VAR);
    }

    #[test]
    fn test_parse_full_config() {
        let config = AgentConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.agent_id, "my-ai-agent");
        assert_eq!(config.budget_usd, Amount::from_dollars(100));
        assert_eq!(config.renewal_threshold_usd, Amount::from_cents(1));
        assert_eq!(config.ttl().num_minutes(), 1440);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_defaults_applied() {
        let config = AgentConfig::from_json_str(r#"{"agentId": "a", "budgetUsd": 5}"#).unwrap();
        assert_eq!(config.scope, "*");
        assert_eq!(config.ttl_minutes, 1440);
        assert_eq!(config.renewal_threshold_usd, Amount::from_cents(1));
        assert_eq!(config.expiry_margin_seconds, 0);

        let params = config.issuance_params().unwrap();
        assert_eq!(params.budget, Amount::from_dollars(5));
        assert_eq!(params.ttl_minutes(), 1440);
    }

    #[test]
    fn test_api_key_in_file_rejected() {
        let json = r#"{"agentId": "a", "budgetUsd": 5, "apiKey": "pk_live_123"}"#;
        let err = AgentConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("AGENTPAY_API_KEY"));
    }

    #[test]
    fn test_threshold_above_budget_rejected() {
        let json = r#"{"agentId": "a", "budgetUsd": 1, "renewalThresholdUsd": 2}"#;
        let err = AgentConfig::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("renewalThresholdUsd"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AgentConfig::from_json_str(r#"{"agentId": "", "budgetUsd": 1}"#).is_err());
        assert!(
            AgentConfig::from_json_str(r#"{"agentId": "a", "budgetUsd": 1, "ttlMinutes": 0}"#)
                .is_err()
        );
        assert!(AgentConfig::from_json_str(r#"{"agentId": "a", "budgetUsd": -1}"#).is_err());
        assert!(AgentConfig::from_json_str(
            r#"{"agentId": "a", "budgetUsd": 1, "apiUrl": "ftp://example.com"}"#
        )
        .is_err());
    }

    #[test]
    fn test_api_key_debug_redacted() {
        let key = ApiKey::new("pk_live_secret").unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(****)");
        assert_eq!(key.expose(), "pk_live_secret");
        assert!(ApiKey::new("   ").is_err());
    }

    #[test]
    fn test_api_key_trimmed() {
        let key = ApiKey::new("  pk_live_secret\n").unwrap();
        assert_eq!(key.expose(), "pk_live_secret");
    }

    #[test]
    fn test_margin_not_shorter_than_ttl_rejected() {
        let with_margin = |seconds: u32| {
            let json = serde_json::json!({
                "agentId": "a",
                "budgetUsd": 1,
                "ttlMinutes": 1,
                "expiryMarginSeconds": seconds
            });
            AgentConfig::from_json_str(&json.to_string())
        };

        let err = with_margin(120).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("expiryMarginSeconds"));
        assert!(with_margin(60).is_err());
        assert_eq!(with_margin(59).unwrap().expiry_margin_seconds, 59);
    }

    #[test]
    #[serial]
    fn test_loader_reads_file_and_env_key() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, SAMPLE);
        std::env::set_var(AGENTPAY_API_KEY_VAR, "pk_test_abc");

        let config = ConfigLoader::new().path(&path).load().unwrap();
        assert_eq!(config.agent_id, "my-ai-agent");
        assert_eq!(
            config.api_key.as_ref().map(ApiKey::expose),
            Some("pk_test_abc")
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_loader_env_overrides() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, SAMPLE);
        std::env::set_var(AGENTPAY_AGENT_ID_VAR, "override-agent");
        std::env::set_var(AGENTPAY_API_URL_VAR, "http://127.0.0.1:9000");

        let config = ConfigLoader::new().path(&path).load().unwrap();
        assert_eq!(config.agent_id, "override-agent");
        assert_eq!(config.api_url, "http://127.0.0.1:9000");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_loader_without_env_ignores_environment() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, SAMPLE);
        std::env::set_var(AGENTPAY_API_KEY_VAR, "pk_test_abc");
        std::env::set_var(AGENTPAY_AGENT_ID_VAR, "override-agent");

        let config = ConfigLoader::new().path(&path).without_env().load().unwrap();
        assert_eq!(config.agent_id, "my-ai-agent");
        assert!(config.api_key.is_none());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_loader_blank_env_key_rejected() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, SAMPLE);
        std::env::set_var(AGENTPAY_API_KEY_VAR, "  ");

        let err = ConfigLoader::new().path(&path).load().unwrap_err();
        assert!(matches!(err, Error::Environment { .. }));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_explicit_key_wins_over_env() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, SAMPLE);
        std::env::set_var(AGENTPAY_API_KEY_VAR, "from-env");

        let config = ConfigLoader::new()
            .path(&path)
            .api_key(ApiKey::new("explicit").unwrap())
            .load()
            .unwrap();
        assert_eq!(config.api_key.as_ref().map(ApiKey::expose), Some("explicit"));

        clear_env();
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        let err = ConfigLoader::new().path(&path).without_env().load().unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "{ not json");
        let err = ConfigLoader::new().path(&path).without_env().load().unwrap_err();
        assert!(err.to_string().contains("agentpay.config.json"));
    }

    #[test]
    fn test_amount_string_and_number_equivalent() {
        let a = AgentConfig::from_json_str(r#"{"agentId": "a", "budgetUsd": "12.50"}"#).unwrap();
        let b = AgentConfig::from_json_str(r#"{"agentId": "a", "budgetUsd": 12.5}"#).unwrap();
        assert_eq!(a.budget_usd, b.budget_usd);
        assert_eq!(a.budget_usd, Amount::from_str("12.5").unwrap());
    }
}
