//! Error handling for the election core

use crate::types::{CandidacyId, ElectionId, ElectionStatus, IdentityId};
use uuid::Uuid;

/// Result type alias for the election core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the election core
///
/// Every variant is scoped to the single operation that produced it. Domain
/// refusals and storage failures are kept apart so a caller can tell
/// "you can't do this" from "the system is down".
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed input at creation or application time
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// Role or capability mismatch
    #[error("Not authorized: {reason}")]
    NotAuthorized { reason: String },

    /// Operation attempted outside the statuses that allow it
    #[error("Election {election_id} is {status}, cannot {operation}")]
    InvalidElectionState {
        election_id: ElectionId,
        status: ElectionStatus,
        operation: String,
    },

    /// Identity already holds a candidacy in this election
    #[error("Identity {identity_id} has already applied to election {election_id}")]
    DuplicateCandidacy {
        election_id: ElectionId,
        identity_id: IdentityId,
    },

    /// Voter already holds a ballot in this election
    #[error("Voter {voter_id} has already voted in election {election_id}")]
    DuplicateVote {
        election_id: ElectionId,
        voter_id: IdentityId,
    },

    /// Backward, same-state, or disallowed skip transition
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ElectionStatus,
        to: ElectionStatus,
    },

    /// Referenced record does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// Candidacy is unknown or belongs to a different election
    #[error("Candidacy {candidacy_id} not found in election {election_id}")]
    CandidacyNotFound {
        election_id: ElectionId,
        candidacy_id: CandidacyId,
    },

    /// The record store failed
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new authorization error
    pub fn not_authorized(reason: impl Into<String>) -> Self {
        Self::NotAuthorized {
            reason: reason.into(),
        }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create a new invalid-state error
    pub fn invalid_state(
        election_id: ElectionId,
        status: ElectionStatus,
        operation: impl Into<String>,
    ) -> Self {
        Self::InvalidElectionState {
            election_id,
            status,
            operation: operation.into(),
        }
    }

    /// Only infrastructure failures are worth retrying; domain refusals are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }

    /// True for refusals produced by the election rules themselves
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            Self::StorageUnavailable { .. } | Self::Config { .. } | Self::Serialization(_)
        )
    }
}

/// Convenience macros for creating specific error types
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $msg:expr) => {
        $crate::Error::validation($field, $msg)
    };
    ($field:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::Error::validation($field, format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr) => {
        $crate::Error::storage($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::storage(format!($fmt, $($arg)*))
    };
}
