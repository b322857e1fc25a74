//! Candidacy registry
//!
//! Admits candidates into an election's race, at most once per identity per
//! election. The duplicate check is the store's insert-if-absent, so two
//! concurrent applications from one identity cannot both succeed. The store
//! writes the candidacy and its link into `election.candidates` together,
//! and refuses both once the election has left `upcoming`.

use crate::store::{InsertOutcome, RecordStore};
use crate::types::{Candidacy, ElectionId, IdentityId};
use crate::{Error, Result, validation_error};
use std::sync::Arc;

pub struct CandidacyRegistry {
    store: Arc<dyn RecordStore>,
}

impl CandidacyRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Register `identity_id` as a candidate for `position` in an election
    pub fn apply(
        &self,
        identity_id: IdentityId,
        election_id: ElectionId,
        position: &str,
    ) -> Result<Candidacy> {
        let position = position.trim();
        if position.is_empty() {
            return Err(validation_error!("position", "must not be empty"));
        }

        let election = self
            .store
            .election(election_id)?
            .ok_or_else(|| Error::not_found("Election", election_id))?;
        let identity = self
            .store
            .identity(identity_id)?
            .ok_or_else(|| Error::not_found("Identity", identity_id))?;

        let candidacy = Candidacy::new(
            election.id,
            identity.id,
            identity.name.clone(),
            position.to_string(),
        );

        let candidacy = match self.store.register_candidacy(candidacy)? {
            InsertOutcome::Inserted(candidacy) => candidacy,
            InsertOutcome::AlreadyExists(_) => {
                tracing::warn!(
                    "🚫 Duplicate candidacy refused: identity={}, election={}",
                    identity_id,
                    election_id
                );
                return Err(Error::DuplicateCandidacy {
                    election_id,
                    identity_id,
                });
            }
        };

        tracing::info!(
            "📝 Candidacy registered: id={}, identity={}, election={}, position={:?}",
            candidacy.id,
            identity_id,
            election_id,
            candidacy.position
        );

        Ok(candidacy)
    }

    /// All candidacies in an election, in application order
    pub fn candidacies(&self, election_id: ElectionId) -> Result<Vec<Candidacy>> {
        let mut candidacies = self.store.candidacies_for_election(election_id)?;
        candidacies.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then(a.id.cmp(&b.id)));
        Ok(candidacies)
    }

    pub fn candidacy_for(
        &self,
        election_id: ElectionId,
        identity_id: IdentityId,
    ) -> Result<Option<Candidacy>> {
        self.store.candidacy_for(election_id, identity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{Election, ElectionStatus, Role};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn setup() -> (Arc<InMemoryStore>, CandidacyRegistry, Election) {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let election = Election::new(
            "Council".to_string(),
            "Council election".to_string(),
            now + Duration::hours(1),
            now + Duration::hours(2),
            Uuid::new_v4(),
        );
        store.insert_election(election.clone()).unwrap();
        let registry = CandidacyRegistry::new(store.clone());
        (store, registry, election)
    }

    #[test]
    fn test_apply_creates_linked_candidacy() {
        let (store, registry, election) = setup();
        let cal = store.register("Cal", "cal@example.com", Role::Candidate).unwrap();

        let candidacy = registry.apply(cal.id, election.id, " Chair ").unwrap();
        assert_eq!(candidacy.vote_count, 0);
        assert_eq!(candidacy.name, "Cal");
        assert_eq!(candidacy.position, "Chair");

        let stored = store.election(election.id).unwrap().unwrap();
        assert_eq!(stored.candidates, vec![candidacy.id]);
    }

    #[test]
    fn test_duplicate_application() {
        let (store, registry, election) = setup();
        let cal = store.register("Cal", "cal@example.com", Role::Candidate).unwrap();

        registry.apply(cal.id, election.id, "Chair").unwrap();
        let second = registry.apply(cal.id, election.id, "Treasurer");
        assert!(matches!(second, Err(Error::DuplicateCandidacy { .. })));

        assert_eq!(registry.candidacies(election.id).unwrap().len(), 1);
        assert_eq!(store.election(election.id).unwrap().unwrap().candidates.len(), 1);
    }

    #[test]
    fn test_unknown_references() {
        let (store, registry, election) = setup();
        let cal = store.register("Cal", "cal@example.com", Role::Candidate).unwrap();

        let no_election = registry.apply(cal.id, Uuid::new_v4(), "Chair");
        assert!(matches!(no_election, Err(Error::NotFound { entity: "Election", .. })));

        let no_identity = registry.apply(Uuid::new_v4(), election.id, "Chair");
        assert!(matches!(no_identity, Err(Error::NotFound { entity: "Identity", .. })));

        let blank = registry.apply(cal.id, election.id, "   ");
        assert!(matches!(blank, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_apply_after_election_opens() {
        let (store, registry, election) = setup();
        let cal = store.register("Cal", "cal@example.com", Role::Candidate).unwrap();
        store
            .swap_election_status(election.id, ElectionStatus::Upcoming, ElectionStatus::Active)
            .unwrap();

        let late = registry.apply(cal.id, election.id, "Chair");
        assert!(matches!(late, Err(Error::InvalidElectionState { .. })));
        assert!(registry.candidacies(election.id).unwrap().is_empty());
        assert!(store.election(election.id).unwrap().unwrap().candidates.is_empty());
    }

    #[test]
    fn test_candidacy_lookup() {
        let (store, registry, election) = setup();
        let cal = store.register("Cal", "cal@example.com", Role::Candidate).unwrap();
        assert!(registry.candidacy_for(election.id, cal.id).unwrap().is_none());

        let candidacy = registry.apply(cal.id, election.id, "Chair").unwrap();
        assert_eq!(registry.candidacy_for(election.id, cal.id).unwrap(), Some(candidacy));
    }
}
