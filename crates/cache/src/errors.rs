//! Errors surfaced by the lifecycle manager

use agentpay_core::AuthorityError;

/// Failure of `ensure_valid` or `refresh`.
///
/// Every caller that waited on the same flight receives an equal value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The authority call failed
    #[error("mandate renewal for '{subject}' failed: {source}")]
    Authority {
        subject: String,
        #[source]
        source: AuthorityError,
    },

    /// The authority returned a record that violates its invariants
    #[error("rejected mandate for '{subject}': {reason}")]
    InvalidRecord { subject: String, reason: String },

    /// `refresh` was asked for a subject with nothing cached
    #[error("no mandate cached for '{subject}'")]
    NoMandate { subject: String },

    /// The flight task ended without a result (panic or runtime shutdown)
    #[error("mandate flight for '{subject}' aborted: {message}")]
    Aborted { subject: String, message: String },
}

impl LifecycleError {
    #[must_use]
    pub fn authority(subject: impl Into<String>, source: AuthorityError) -> Self {
        Self::Authority {
            subject: subject.into(),
            source,
        }
    }

    #[must_use]
    pub fn invalid_record(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// The underlying authority error, if this failure came from the remote call
    #[must_use]
    pub fn authority_error(&self) -> Option<&AuthorityError> {
        match self {
            Self::Authority { source, .. } => Some(source),
            _ => None,
        }
    }
}
