//! Authorization gate
//!
//! A single decision table mapping an identity, an operation and the facts
//! about its target to allow or deny. The gate performs no I/O; callers look
//! up the facts and hand them in as an [`AccessContext`].

use crate::types::{Election, ElectionStatus, Identity, Role};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations guarded by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    CreateElection,
    TransitionElection,
    ApplyAsCandidate,
    CastVote,
    ViewResults,
}

impl Operation {
    /// Role an identity must hold, or `None` when any signed-in identity may proceed
    pub fn required_role(self) -> Option<Role> {
        match self {
            Operation::CreateElection | Operation::TransitionElection => Some(Role::Admin),
            Operation::ApplyAsCandidate => Some(Role::Candidate),
            Operation::CastVote => Some(Role::Voter),
            Operation::ViewResults => None,
        }
    }

    /// Election status the operation requires, if any
    pub fn required_status(self) -> Option<ElectionStatus> {
        match self {
            Operation::CreateElection | Operation::TransitionElection => None,
            Operation::ApplyAsCandidate => Some(ElectionStatus::Upcoming),
            Operation::CastVote => Some(ElectionStatus::Active),
            Operation::ViewResults => Some(ElectionStatus::Completed),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CreateElection => "create election",
            Operation::TransitionElection => "transition election",
            Operation::ApplyAsCandidate => "apply as candidate",
            Operation::CastVote => "cast vote",
            Operation::ViewResults => "view results",
        };
        f.write_str(name)
    }
}

/// Facts about the operation's target
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessContext<'a> {
    pub election: Option<&'a Election>,

    /// A candidacy already exists for (identity, election)
    pub has_candidacy: bool,

    /// A ballot already exists for (identity, election)
    pub has_ballot: bool,
}

impl<'a> AccessContext<'a> {
    pub fn for_election(election: &'a Election) -> Self {
        Self {
            election: Some(election),
            ..Self::default()
        }
    }

    pub fn with_candidacy(mut self, has_candidacy: bool) -> Self {
        self.has_candidacy = has_candidacy;
        self
    }

    pub fn with_ballot(mut self, has_ballot: bool) -> Self {
        self.has_ballot = has_ballot;
        self
    }
}

/// Why the gate refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    NotAuthorized(String),
    InvalidElectionState {
        status: ElectionStatus,
        required: ElectionStatus,
    },
    DuplicateCandidacy,
    DuplicateVote,
}

/// Outcome of [`authorize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Convert a denial into the matching crate error
    pub fn into_result(
        self,
        identity: Option<&Identity>,
        operation: Operation,
        context: AccessContext<'_>,
    ) -> Result<()> {
        let reason = match self {
            Decision::Allow => return Ok(()),
            Decision::Deny(reason) => reason,
        };

        let election_id = context.election.map(|e| e.id).unwrap_or_default();
        let identity_id = identity.map(|i| i.id).unwrap_or_default();

        Err(match reason {
            DenyReason::NotAuthorized(reason) => Error::not_authorized(reason),
            DenyReason::InvalidElectionState { status, .. } => {
                Error::invalid_state(election_id, status, operation.to_string())
            }
            DenyReason::DuplicateCandidacy => Error::DuplicateCandidacy {
                election_id,
                identity_id,
            },
            DenyReason::DuplicateVote => Error::DuplicateVote {
                election_id,
                voter_id: identity_id,
            },
        })
    }
}

/// Decide whether `identity` may perform `operation`
///
/// Checks run in a fixed order: authentication, role, election status,
/// then uniqueness. The first failing check names the denial.
pub fn authorize(
    identity: Option<&Identity>,
    operation: Operation,
    context: AccessContext<'_>,
) -> Decision {
    let Some(identity) = identity else {
        return Decision::Deny(DenyReason::NotAuthorized(
            "no authenticated identity".to_string(),
        ));
    };

    if let Some(role) = operation.required_role() {
        if identity.role != role {
            return Decision::Deny(DenyReason::NotAuthorized(format!(
                "{} requires role {}, caller is {}",
                operation, role, identity.role
            )));
        }
    }

    if let Some(required) = operation.required_status() {
        let Some(election) = context.election else {
            return Decision::Deny(DenyReason::NotAuthorized(format!(
                "{operation} requires a target election"
            )));
        };
        if election.status != required {
            return Decision::Deny(DenyReason::InvalidElectionState {
                status: election.status,
                required,
            });
        }
    }

    match operation {
        Operation::ApplyAsCandidate if context.has_candidacy => {
            Decision::Deny(DenyReason::DuplicateCandidacy)
        }
        Operation::CastVote if context.has_ballot => Decision::Deny(DenyReason::DuplicateVote),
        _ => Decision::Allow,
    }
}

/// [`authorize`], with a denial returned as the matching crate error
pub fn require(
    identity: Option<&Identity>,
    operation: Operation,
    context: AccessContext<'_>,
) -> Result<()> {
    authorize(identity, operation, context).into_result(identity, operation, context)
}
