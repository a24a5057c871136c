//! Request and response bodies of the mandate authority API

use agentpay_core::{Amount, AuthorityError, MandateEnvelope, MandateRecord};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct IssueRequest<'a> {
    pub subject: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub budget_usd: Decimal,
    pub scope: &'a str,
    pub ttl_minutes: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IssueResponse {
    pub mandate_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyRequest<'a> {
    pub mandate_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyResponse {
    pub valid: bool,
    #[serde(default)]
    pub payload: Option<VerifyPayload>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Decoded mandate claims. Amounts arrive as numbers or strings.
#[derive(Debug, Deserialize)]
pub(crate) struct VerifyPayload {
    pub sub: String,
    pub budget_usd: Amount,
    pub budget_remaining: Amount,
    #[serde(default = "default_scope")]
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

fn default_scope() -> String {
    agentpay_core::DEFAULT_SCOPE.to_string()
}

/// Error body of a non-success response
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

impl VerifyPayload {
    /// Build a record for `token`.
    ///
    /// Envelope invariants are not checked here; the lifecycle manager
    /// validates every record before caching it.
    pub fn into_record(self, token: &str) -> Result<MandateRecord, AuthorityError> {
        let envelope = MandateEnvelope {
            subject: self.sub,
            scope: self.scope,
            budget_total: self.budget_usd,
            budget_remaining: self.budget_remaining,
            issued_at: timestamp("iat", self.iat)?,
            expires_at: timestamp("exp", self.exp)?,
        };
        Ok(MandateRecord::new_unchecked(token, envelope))
    }
}

fn timestamp(field: &str, secs: i64) -> Result<DateTime<Utc>, AuthorityError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        AuthorityError::invalid_response(format!("{field} {secs} is not a valid unix timestamp"))
    })
}
