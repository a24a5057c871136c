//! Mandate records as produced by the remote authority

use super::amount::Amount;
use crate::errors::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Decoded metadata returned alongside a mandate token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandateEnvelope {
    pub subject: String,
    pub scope: String,
    pub budget_total: Amount,
    pub budget_remaining: Amount,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// An issued spending mandate.
///
/// Immutable once constructed. The token is opaque and only ever forwarded;
/// budget decrements are observed by re-verifying, never applied here.
#[derive(Clone, PartialEq, Eq)]
pub struct MandateRecord {
    token: String,
    envelope: MandateEnvelope,
}

impl MandateRecord {
    /// Create a new record, enforcing the envelope invariants
    pub fn new(token: impl Into<String>, envelope: MandateEnvelope) -> Result<Self> {
        let record = Self::new_unchecked(token, envelope);
        record.validate()?;
        Ok(record)
    }

    /// Create a record without validation.
    ///
    /// Consumers that cache records must still call [`MandateRecord::validate`].
    #[must_use]
    pub fn new_unchecked(token: impl Into<String>, envelope: MandateEnvelope) -> Self {
        Self {
            token: token.into(),
            envelope,
        }
    }

    /// Check `0 <= remaining <= total`, `issued_at < expires_at`, and a
    /// non-empty token and subject.
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(Error::invalid_record("token must not be empty"));
        }
        let env = &self.envelope;
        if env.subject.is_empty() {
            return Err(Error::invalid_record("subject must not be empty"));
        }
        if env.budget_remaining > env.budget_total {
            return Err(Error::invalid_record(format!(
                "budget_remaining {} exceeds budget_total {}",
                env.budget_remaining, env.budget_total
            )));
        }
        if env.issued_at >= env.expires_at {
            return Err(Error::invalid_record(format!(
                "expires_at {} is not after issued_at {}",
                env.expires_at.to_rfc3339(),
                env.issued_at.to_rfc3339()
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn envelope(&self) -> &MandateEnvelope {
        &self.envelope
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.envelope.subject
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.envelope.scope
    }

    #[must_use]
    pub fn budget_total(&self) -> Amount {
        self.envelope.budget_total
    }

    #[must_use]
    pub fn budget_remaining(&self) -> Amount {
        self.envelope.budget_remaining
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.envelope.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.envelope.expires_at
    }
}

// Tokens are credentials; keep them out of debug output.
impl fmt::Debug for MandateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MandateRecord")
            .field("token", &format_args!("<{} bytes>", self.token.len()))
            .field("envelope", &self.envelope)
            .finish()
    }
}

/// What to ask for when a mandate is issued or renewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceParams {
    pub budget: Amount,
    pub scope: String,
    pub ttl: Duration,
}

impl IssuanceParams {
    /// Create issuance parameters, rejecting a non-positive TTL
    pub fn new(budget: Amount, scope: impl Into<String>, ttl: Duration) -> Result<Self> {
        if ttl <= Duration::zero() {
            return Err(Error::validation("ttl", "must be positive"));
        }
        Ok(Self {
            budget,
            scope: scope.into(),
            ttl,
        })
    }

    /// TTL rounded down to whole minutes, as the authority expects
    #[must_use]
    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes()
    }
}
