//! Ballot ledger
//!
//! Records one ballot per voter per election and bumps the chosen
//! candidacy's tally. Ballot insertion is the store's insert-if-absent on
//! `(election, voter)` and the tally uses the store's atomic increment, so
//! neither a racing double vote nor a lost tally update is possible. The
//! store also rechecks that the election is active in the same write, so a
//! ballot racing the close of an election cannot change published results.

use crate::store::{InsertOutcome, RecordStore};
use crate::types::{Ballot, CandidacyId, ElectionId, IdentityId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Comparison of a candidacy's stored tally with its ballots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyCheck {
    pub candidacy_id: CandidacyId,

    /// `vote_count` as stored on the candidacy
    pub recorded: u64,

    /// Ballots referencing the candidacy
    pub counted: u64,
}

impl TallyCheck {
    pub fn is_consistent(&self) -> bool {
        self.recorded == self.counted
    }
}

pub struct BallotLedger {
    store: Arc<dyn RecordStore>,
}

impl BallotLedger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Record `voter_id`'s vote for `candidacy_id`
    ///
    /// The returned ballot is the caller's own; nothing about other ballots
    /// can be read from it.
    pub fn cast_vote(
        &self,
        election_id: ElectionId,
        candidacy_id: CandidacyId,
        voter_id: IdentityId,
    ) -> Result<Ballot> {
        let candidacy_matches = self
            .store
            .candidacy(candidacy_id)?
            .is_some_and(|c| c.election_id == election_id);
        if !candidacy_matches {
            return Err(Error::CandidacyNotFound {
                election_id,
                candidacy_id,
            });
        }

        match self
            .store
            .record_ballot(Ballot::new(election_id, candidacy_id, voter_id))?
        {
            InsertOutcome::Inserted(ballot) => {
                tracing::info!(
                    "🗳️ Ballot recorded: election={}, voter={}, ballot={}",
                    election_id,
                    voter_id,
                    ballot.id
                );
                Ok(ballot)
            }
            InsertOutcome::AlreadyExists(_) => {
                tracing::warn!(
                    "🚫 Double vote refused: election={}, voter={}",
                    election_id,
                    voter_id
                );
                Err(Error::DuplicateVote {
                    election_id,
                    voter_id,
                })
            }
        }
    }

    pub fn has_voted(&self, election_id: ElectionId, voter_id: IdentityId) -> Result<bool> {
        Ok(self.store.ballot_for(election_id, voter_id)?.is_some())
    }

    /// The voter's own ballot in an election, if cast
    pub fn ballot_for(&self, election_id: ElectionId, voter_id: IdentityId) -> Result<Option<Ballot>> {
        self.store.ballot_for(election_id, voter_id)
    }

    /// Reconcile a candidacy's tally against its ballots
    pub fn verify_tally(&self, candidacy_id: CandidacyId) -> Result<TallyCheck> {
        let candidacy = self
            .store
            .candidacy(candidacy_id)?
            .ok_or_else(|| Error::not_found("Candidacy", candidacy_id))?;
        let counted = self.store.count_ballots_for_candidacy(candidacy_id)?;

        let check = TallyCheck {
            candidacy_id,
            recorded: candidacy.vote_count,
            counted,
        };
        if !check.is_consistent() {
            tracing::error!(
                "❌ Tally mismatch for candidacy {}: recorded={}, counted={}",
                candidacy_id,
                check.recorded,
                check.counted
            );
        }
        Ok(check)
    }

    /// Reconcile every candidacy in an election
    pub fn verify_election(&self, election_id: ElectionId) -> Result<Vec<TallyCheck>> {
        self.store
            .candidacies_for_election(election_id)?
            .into_iter()
            .map(|c| self.verify_tally(c.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{Candidacy, Election, ElectionStatus};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    struct Fixture {
        store: Arc<InMemoryStore>,
        ledger: BallotLedger,
        election: Election,
        alice: Candidacy,
        bob: Candidacy,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let mut election = Election::new(
            "Council".to_string(),
            "Council election".to_string(),
            now - Duration::hours(1),
            now + Duration::hours(1),
            Uuid::new_v4(),
        );
        election.status = ElectionStatus::Active;
        store.insert_election(election.clone()).unwrap();

        let alice = Candidacy::new(election.id, Uuid::new_v4(), "Alice".into(), "Chair".into());
        let bob = Candidacy::new(election.id, Uuid::new_v4(), "Bob".into(), "Chair".into());
        store.insert_candidacy_if_absent(alice.clone()).unwrap();
        store.insert_candidacy_if_absent(bob.clone()).unwrap();

        Fixture {
            ledger: BallotLedger::new(store.clone()),
            store,
            election,
            alice,
            bob,
        }
    }

    #[test]
    fn test_cast_vote_increments_tally() {
        let f = fixture();
        let voter = Uuid::new_v4();

        assert!(!f.ledger.has_voted(f.election.id, voter).unwrap());
        let ballot = f.ledger.cast_vote(f.election.id, f.alice.id, voter).unwrap();
        assert_eq!(ballot.voter_id, voter);
        assert!(f.ledger.has_voted(f.election.id, voter).unwrap());

        let alice = f.store.candidacy(f.alice.id).unwrap().unwrap();
        assert_eq!(alice.vote_count, 1);
        assert!(f.ledger.verify_tally(f.alice.id).unwrap().is_consistent());
    }

    #[test]
    fn test_second_vote_is_refused() {
        let f = fixture();
        let voter = Uuid::new_v4();

        let original = f.ledger.cast_vote(f.election.id, f.alice.id, voter).unwrap();
        let second = f.ledger.cast_vote(f.election.id, f.bob.id, voter);
        assert!(matches!(second, Err(Error::DuplicateVote { .. })));

        assert_eq!(f.store.candidacy(f.alice.id).unwrap().unwrap().vote_count, 1);
        assert_eq!(f.store.candidacy(f.bob.id).unwrap().unwrap().vote_count, 0);
        assert_eq!(f.ledger.ballot_for(f.election.id, voter).unwrap(), Some(original));
    }

    #[test]
    fn test_candidacy_from_other_election() {
        let f = fixture();
        let result = f.ledger.cast_vote(Uuid::new_v4(), f.alice.id, Uuid::new_v4());
        assert!(matches!(result, Err(Error::CandidacyNotFound { .. })));

        let unknown = f.ledger.cast_vote(f.election.id, Uuid::new_v4(), Uuid::new_v4());
        assert!(matches!(unknown, Err(Error::CandidacyNotFound { .. })));
        assert_eq!(f.store.stats().unwrap().ballots, 0);
    }

    #[test]
    fn test_verify_election() {
        let f = fixture();
        for _ in 0..3 {
            f.ledger.cast_vote(f.election.id, f.bob.id, Uuid::new_v4()).unwrap();
        }

        let checks = f.ledger.verify_election(f.election.id).unwrap();
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(TallyCheck::is_consistent));

        let bob = checks.iter().find(|c| c.candidacy_id == f.bob.id).unwrap();
        assert_eq!(bob.counted, 3);
    }

    #[test]
    fn test_vote_after_close_is_refused() {
        let f = fixture();
        f.ledger.cast_vote(f.election.id, f.alice.id, Uuid::new_v4()).unwrap();
        f.store
            .swap_election_status(f.election.id, ElectionStatus::Active, ElectionStatus::Completed)
            .unwrap();

        let late_voter = Uuid::new_v4();
        let late = f.ledger.cast_vote(f.election.id, f.bob.id, late_voter);
        assert!(matches!(
            late,
            Err(Error::InvalidElectionState {
                status: ElectionStatus::Completed,
                ..
            })
        ));
        assert!(!f.ledger.has_voted(f.election.id, late_voter).unwrap());
        assert_eq!(f.store.candidacy(f.bob.id).unwrap().unwrap().vote_count, 0);
        assert_eq!(f.store.stats().unwrap().ballots, 1);
    }

    #[test]
    fn test_storage_failure_is_propagated() {
        let f = fixture();
        f.store.set_offline(true);

        let result = f.ledger.cast_vote(f.election.id, f.alice.id, Uuid::new_v4());
        assert!(matches!(result, Err(Error::StorageUnavailable { .. })));
    }
}
