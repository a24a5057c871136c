//! The remote authority that issues and verifies mandates.
//!
//! The transport is not this crate's concern; an implementation only has to
//! turn a request into a [`MandateRecord`] or an [`AuthorityError`].

use crate::types::{Amount, MandateRecord};
use async_trait::async_trait;
use chrono::Duration;

/// Failure reported by a [`RemoteMandateAuthority`].
///
/// `Clone` so a single failed call can be handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorityError {
    /// The request never produced a response
    #[error("network error for '{endpoint}': {message}")]
    Network { endpoint: String, message: String },

    /// Credentials were missing or refused
    #[error("authority refused credentials: {message}")]
    Unauthorized { message: String },

    /// The authority answered with a non-success status
    #[error("authority rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The response could not be decoded into a mandate
    #[error("invalid response from authority: {message}")]
    InvalidResponse { message: String },

    /// The token is unknown, malformed, or expired server-side
    #[error("mandate token rejected: {message}")]
    InvalidToken { message: String },
}

impl AuthorityError {
    #[must_use]
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }
}

/// Issues and verifies mandates on behalf of an agent.
#[async_trait]
pub trait RemoteMandateAuthority: Send + Sync {
    /// Issue a fresh mandate for `subject`
    async fn issue(
        &self,
        subject: &str,
        budget: Amount,
        scope: &str,
        ttl: Duration,
    ) -> Result<MandateRecord, AuthorityError>;

    /// Resolve a token to its current server-side state
    async fn verify(&self, token: &str) -> Result<MandateRecord, AuthorityError>;
}
