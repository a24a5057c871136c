//! Renewal decisions
//!
//! A pure function of the cached record and the current time. No I/O, no
//! state, so it can be exercised against synthetic clocks and records.

use agentpay_core::{Amount, MandateRecord, DEFAULT_RENEWAL_THRESHOLD_CENTS};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Why a mandate must be replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewReason {
    /// Nothing cached for the subject
    Missing,
    /// `now` has reached `expires_at` (less the safety margin)
    Expired,
    /// Remaining budget fell below the threshold
    BudgetExhausted,
}

impl RenewReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Expired => "expired",
            Self::BudgetExhausted => "budget_exhausted",
        }
    }
}

impl fmt::Display for RenewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`RenewalPolicy::decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Reuse,
    Renew(RenewReason),
}

impl Decision {
    pub fn is_reuse(&self) -> bool {
        matches!(self, Self::Reuse)
    }
}

/// Decides whether a cached mandate can still be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalPolicy {
    /// Renew when `budget_remaining` drops below this absolute floor
    min_remaining: Amount,
    /// Treat a mandate as expired this long before `expires_at`
    expiry_margin: Duration,
}

impl Default for RenewalPolicy {
    fn default() -> Self {
        Self {
            min_remaining: Amount::from_cents(DEFAULT_RENEWAL_THRESHOLD_CENTS),
            expiry_margin: Duration::zero(),
        }
    }
}

impl RenewalPolicy {
    #[must_use]
    pub fn new(min_remaining: Amount) -> Self {
        Self {
            min_remaining,
            ..Self::default()
        }
    }

    /// Set the clock-drift buffer. Negative margins are clamped to zero.
    #[must_use]
    pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
        self.expiry_margin = margin.max(Duration::zero());
        self
    }

    #[must_use]
    pub fn min_remaining(&self) -> Amount {
        self.min_remaining
    }

    #[must_use]
    pub fn expiry_margin(&self) -> Duration {
        self.expiry_margin
    }

    /// Rules, first match wins: absent, expired, below threshold, else reuse.
    #[must_use]
    pub fn decide(&self, record: Option<&MandateRecord>, now: DateTime<Utc>) -> Decision {
        let Some(record) = record else {
            return Decision::Renew(RenewReason::Missing);
        };
        if now >= record.expires_at() - self.expiry_margin {
            return Decision::Renew(RenewReason::Expired);
        }
        if record.budget_remaining() < self.min_remaining {
            return Decision::Renew(RenewReason::BudgetExhausted);
        }
        Decision::Reuse
    }
}
