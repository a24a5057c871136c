//! `reqwest` backed mandate authority

use crate::wire::{ErrorBody, IssueRequest, IssueResponse, VerifyRequest, VerifyResponse};
use agentpay_config::{AgentConfig, ApiKey};
use agentpay_core::{
    Amount, AuthorityError, Error, MandateRecord, RemoteMandateAuthority, Result,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use agentpay_utils::redact_token;
use async_trait::async_trait;
use chrono::Duration;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration as StdDuration;
use tracing::{debug, instrument};
use url::Url;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const AGENT_ID_HEADER: &str = "x-agent-id";

const ISSUE_PATH: &str = "mandates/issue";
const VERIFY_PATH: &str = "mandates/verify";

/// Mandate authority reached over HTTP
#[derive(Clone)]
pub struct HttpAuthority {
    base_url: String,
    client: reqwest::Client,
    api_key: Option<ApiKey>,
    agent_id: Option<String>,
    timeout: StdDuration,
}

impl HttpAuthority {
    /// Create a client for the authority at `base_url` with the default timeout
    pub fn new(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| Error::validation("apiUrl", format!("'{base_url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation(
                "apiUrl",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        let timeout = StdDuration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
            api_key: None,
            agent_id: None,
            timeout,
        })
    }

    /// Client for `config.api_url`, sending the configured key and agent id
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let authority = Self::new(&config.api_url)?.with_agent_id(config.agent_id.clone());
        Ok(match &config.api_key {
            Some(key) => authority.with_api_key(key.clone()),
            None => authority,
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    #[must_use]
    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: StdDuration) -> Result<Self> {
        self.client = build_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    pub fn timeout(&self) -> StdDuration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> std::result::Result<R, AuthorityError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.expose());
        }
        if let Some(agent_id) = &self.agent_id {
            request = request.header(AGENT_ID_HEADER, agent_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthorityError::network(&url, e.to_string()))?;

        let status = response.status();
        debug!(endpoint = %url, status = status.as_u16(), "authority responded");

        if !status.is_success() {
            let message = error_message(status, response).await;
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    AuthorityError::unauthorized(message)
                }
                _ => AuthorityError::rejected(status.as_u16(), message),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AuthorityError::network(&url, e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AuthorityError::invalid_response(format!("{path}: {e}")))
    }
}

impl fmt::Debug for HttpAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAuthority")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("agent_id", &self.agent_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn build_client(timeout: StdDuration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))
}

/// Best-effort message from an error response body
async fn error_message(status: StatusCode, response: reqwest::Response) -> String {
    let fallback = status
        .canonical_reason()
        .unwrap_or("unexpected status")
        .to_string();
    let Ok(text) = response.text().await else {
        return fallback;
    };
    if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
        if let Some(message) = body.into_message() {
            return message;
        }
    }
    let text = text.trim();
    if text.is_empty() {
        fallback
    } else {
        text.to_string()
    }
}

#[async_trait]
impl RemoteMandateAuthority for HttpAuthority {
    #[instrument(skip_all, fields(subject = %subject, scope = %scope))]
    async fn issue(
        &self,
        subject: &str,
        budget: Amount,
        scope: &str,
        ttl: Duration,
    ) -> std::result::Result<MandateRecord, AuthorityError> {
        let request = IssueRequest {
            subject,
            budget_usd: budget.as_decimal(),
            scope,
            ttl_minutes: ttl.num_minutes(),
        };
        let issued: IssueResponse = self.post(ISSUE_PATH, &request).await?;
        if issued.mandate_token.is_empty() {
            return Err(AuthorityError::invalid_response(
                "issue response carried an empty mandateToken",
            ));
        }
        debug!(token = %redact_token(&issued.mandate_token), "mandate issued, verifying");
        self.verify(&issued.mandate_token).await
    }

    #[instrument(skip_all, fields(token = %redact_token(token)))]
    async fn verify(&self, token: &str) -> std::result::Result<MandateRecord, AuthorityError> {
        let request = VerifyRequest {
            mandate_token: token,
        };
        let verified: VerifyResponse = self.post(VERIFY_PATH, &request).await?;
        if !verified.valid {
            return Err(AuthorityError::invalid_token(
                verified
                    .error
                    .unwrap_or_else(|| "mandate is not valid".to_string()),
            ));
        }
        verified
            .payload
            .ok_or_else(|| AuthorityError::invalid_response("valid mandate without payload"))?
            .into_record(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(HttpAuthority::new("not a url").is_err());
        assert!(HttpAuthority::new("ftp://example.com").is_err());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let authority = HttpAuthority::new("https://api.example.com/v1/").unwrap();
        assert_eq!(
            authority.endpoint(ISSUE_PATH),
            "https://api.example.com/v1/mandates/issue"
        );
    }

    #[test]
    fn test_from_config_carries_identity() {
        let mut config = AgentConfig::new("agent-1", Amount::from_dollars(10)).unwrap();
        config.api_key = Some(ApiKey::new("secret").unwrap());

        let authority = HttpAuthority::from_config(&config).unwrap();
        assert_eq!(authority.agent_id.as_deref(), Some("agent-1"));
        assert!(authority.api_key.is_some());
        assert_eq!(
            authority.timeout(),
            StdDuration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert!(!format!("{authority:?}").contains("secret"));
    }
}
