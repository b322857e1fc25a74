//! Record store and identity collaborator contract
//!
//! The election core holds no authoritative state. Every record lives behind
//! a [`RecordStore`], which must provide atomic insert-if-absent on the two
//! uniqueness keys and an atomic tally increment. The current caller is
//! resolved through an [`IdentityProvider`].

pub mod memory;

use crate::{Error, Result};
use crate::types::{
    Ballot, Candidacy, CandidacyId, Election, ElectionId, ElectionStatus, Identity, IdentityId,
};

pub use memory::{InMemoryStore, Session};

/// Result of an atomic insert-if-absent
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome<T> {
    /// The record was written
    Inserted(T),

    /// A record already held the unique key; nothing was written
    AlreadyExists(T),
}

impl<T> InsertOutcome<T> {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

/// Result of an atomic compare-and-set on an election's status
#[derive(Debug, Clone, PartialEq)]
pub enum StatusSwap {
    /// Status matched the expected value and was replaced
    Swapped(Election),

    /// Status had already moved; the current record is returned unchanged
    Stale(Election),

    /// No election with that id
    Missing,
}

/// Durable collections plus the atomic primitives the core relies on
///
/// Implementations must make `insert_candidacy_if_absent`,
/// `insert_ballot_if_absent`, `increment_vote_count` and
/// `swap_election_status` atomic with respect to concurrent callers. Any
/// infrastructure failure is reported as [`crate::Error::StorageUnavailable`].
pub trait RecordStore: Send + Sync {
    /// Insert an identity, unique by id and by email
    fn insert_identity(&self, identity: Identity) -> Result<InsertOutcome<Identity>>;

    fn identity(&self, id: IdentityId) -> Result<Option<Identity>>;

    fn insert_election(&self, election: Election) -> Result<()>;

    fn election(&self, id: ElectionId) -> Result<Option<Election>>;

    fn elections(&self) -> Result<Vec<Election>>;

    /// Replace the status only if it still equals `expected`
    fn swap_election_status(
        &self,
        id: ElectionId,
        expected: ElectionStatus,
        new: ElectionStatus,
    ) -> Result<StatusSwap>;

    /// Insert a candidacy unless one exists for `(election_id, identity_id)`
    fn insert_candidacy_if_absent(&self, candidacy: Candidacy) -> Result<InsertOutcome<Candidacy>>;

    /// Append a candidacy to the election's denormalized candidate list
    ///
    /// Callers registering a new candidacy go through `register_candidacy`.
    fn link_candidacy(&self, election_id: ElectionId, candidacy_id: CandidacyId) -> Result<()>;

    fn candidacy(&self, id: CandidacyId) -> Result<Option<Candidacy>>;

    fn candidacies_for_election(&self, election_id: ElectionId) -> Result<Vec<Candidacy>>;

    fn candidacy_for(
        &self,
        election_id: ElectionId,
        identity_id: IdentityId,
    ) -> Result<Option<Candidacy>>;

    /// Insert a ballot unless one exists for `(election_id, voter_id)`
    fn insert_ballot_if_absent(&self, ballot: Ballot) -> Result<InsertOutcome<Ballot>>;

    /// Add one to a candidacy's tally and return the new count
    ///
    /// Must not depend on any caller-held copy of the current value.
    fn increment_vote_count(&self, candidacy_id: CandidacyId) -> Result<u64>;

    fn ballot_for(&self, election_id: ElectionId, voter_id: IdentityId) -> Result<Option<Ballot>>;

    fn count_ballots_for_candidacy(&self, candidacy_id: CandidacyId) -> Result<u64>;

    /// Insert a candidacy and link it into its election's candidate list
    ///
    /// Refused with `InvalidElectionState` unless the election is still
    /// upcoming. Stores with transactions should override this so the
    /// status check and both writes commit together.
    fn register_candidacy(&self, candidacy: Candidacy) -> Result<InsertOutcome<Candidacy>> {
        let election = self
            .election(candidacy.election_id)?
            .ok_or_else(|| Error::not_found("Election", candidacy.election_id))?;
        require_status(&election, ElectionStatus::Upcoming, "apply as candidate")?;

        let outcome = self.insert_candidacy_if_absent(candidacy)?;
        if let InsertOutcome::Inserted(ref registered) = outcome {
            self.link_candidacy(registered.election_id, registered.id)?;
        }
        Ok(outcome)
    }

    /// Insert a ballot and, if it was new, increment its candidacy's tally
    ///
    /// Refused with `InvalidElectionState` unless the election is active.
    /// Stores with transactions should override this so the status check
    /// and both writes commit together.
    fn record_ballot(&self, ballot: Ballot) -> Result<InsertOutcome<Ballot>> {
        let election = self
            .election(ballot.election_id)?
            .ok_or_else(|| Error::not_found("Election", ballot.election_id))?;
        require_status(&election, ElectionStatus::Active, "cast vote")?;

        let outcome = self.insert_ballot_if_absent(ballot)?;
        if let InsertOutcome::Inserted(ref recorded) = outcome {
            self.increment_vote_count(recorded.candidacy_id)?;
        }
        Ok(outcome)
    }
}

/// Refuse a write unless the election is in `required` status
pub(crate) fn require_status(
    election: &Election,
    required: ElectionStatus,
    operation: &str,
) -> Result<()> {
    if election.status != required {
        return Err(Error::invalid_state(election.id, election.status, operation));
    }
    Ok(())
}

/// Accessor for the authenticated caller
pub trait IdentityProvider: Send + Sync {
    /// The caller's identity, or `None` when unauthenticated
    fn current_identity(&self) -> Result<Option<Identity>>;
}
