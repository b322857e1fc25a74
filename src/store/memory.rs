//! In-memory record store
//!
//! All collections sit behind a single `RwLock`, so every write primitive is
//! one critical section. The two uniqueness keys are kept as secondary
//! indexes and checked in the same critical section as the insert.

use super::{IdentityProvider, InsertOutcome, RecordStore, StatusSwap, require_status};
use crate::types::{
    Ballot, BallotId, Candidacy, CandidacyId, Election, ElectionId, ElectionStatus, Identity,
    IdentityId, Role,
};
use crate::{Error, Result, storage_error, validation_error};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    identities: HashMap<IdentityId, Identity>,
    emails: HashMap<String, IdentityId>,
    elections: HashMap<ElectionId, Election>,
    candidacies: HashMap<CandidacyId, Candidacy>,
    candidacy_index: HashMap<(ElectionId, IdentityId), CandidacyId>,
    ballots: HashMap<BallotId, Ballot>,
    ballot_index: HashMap<(ElectionId, IdentityId), BallotId>,
}

impl Tables {
    fn insert_ballot(&mut self, ballot: Ballot) -> InsertOutcome<Ballot> {
        let key = (ballot.election_id, ballot.voter_id);
        if let Some(existing) = self
            .ballot_index
            .get(&key)
            .and_then(|id| self.ballots.get(id))
        {
            return InsertOutcome::AlreadyExists(existing.clone());
        }

        self.ballot_index.insert(key, ballot.id);
        self.ballots.insert(ballot.id, ballot.clone());
        InsertOutcome::Inserted(ballot)
    }

    fn increment(&mut self, candidacy_id: CandidacyId) -> Result<u64> {
        let candidacy = self
            .candidacies
            .get_mut(&candidacy_id)
            .ok_or_else(|| Error::not_found("Candidacy", candidacy_id))?;
        candidacy.vote_count += 1;
        Ok(candidacy.vote_count)
    }
}

/// Record counts held by an [`InMemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub identities: usize,
    pub elections: usize,
    pub candidacies: usize,
    pub ballots: usize,
}

/// Reference [`RecordStore`] keeping every collection in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while offline every call fails with `StorageUnavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Register a voter or candidate
    ///
    /// Admin accounts cannot self-register; use [`InMemoryStore::seed_admin`].
    pub fn register(&self, name: &str, email: &str, role: Role) -> Result<Identity> {
        if role == Role::Admin {
            return Err(validation_error!("role", "admin accounts cannot be self-registered"));
        }
        self.create_identity(name, email, role)
    }

    /// Create an admin account
    pub fn seed_admin(&self, name: &str, email: &str) -> Result<Identity> {
        self.create_identity(name, email, Role::Admin)
    }

    fn create_identity(&self, name: &str, email: &str, role: Role) -> Result<Identity> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(validation_error!("name", "must not be empty"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(validation_error!("email", "must be a valid address"));
        }

        match self.insert_identity(Identity::new(name, email, role))? {
            InsertOutcome::Inserted(identity) => {
                tracing::info!("👤 Identity registered: id={}, role={}", identity.id, identity.role);
                Ok(identity)
            }
            InsertOutcome::AlreadyExists(_) => {
                Err(validation_error!("email", "{} is already registered", email))
            }
        }
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let tables = self.read()?;
        Ok(StoreStats {
            identities: tables.identities.len(),
            elections: tables.elections.len(),
            candidacies: tables.candidacies.len(),
            ballots: tables.ballots.len(),
        })
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(storage_error!("record store is offline"));
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.check_online()?;
        self.tables
            .read()
            .map_err(|_| storage_error!("Record store read error"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.check_online()?;
        self.tables
            .write()
            .map_err(|_| storage_error!("Record store write error"))
    }
}

impl RecordStore for InMemoryStore {
    fn insert_identity(&self, identity: Identity) -> Result<InsertOutcome<Identity>> {
        let mut tables = self.write()?;
        let email_key = identity.email.to_lowercase();

        let existing = tables
            .identities
            .get(&identity.id)
            .or_else(|| {
                tables
                    .emails
                    .get(&email_key)
                    .and_then(|id| tables.identities.get(id))
            })
            .cloned();
        if let Some(existing) = existing {
            return Ok(InsertOutcome::AlreadyExists(existing));
        }

        tables.emails.insert(email_key, identity.id);
        tables.identities.insert(identity.id, identity.clone());
        Ok(InsertOutcome::Inserted(identity))
    }

    fn identity(&self, id: IdentityId) -> Result<Option<Identity>> {
        Ok(self.read()?.identities.get(&id).cloned())
    }

    fn insert_election(&self, election: Election) -> Result<()> {
        let mut tables = self.write()?;
        if tables.elections.contains_key(&election.id) {
            return Err(storage_error!("election {} already stored", election.id));
        }
        tables.elections.insert(election.id, election);
        Ok(())
    }

    fn election(&self, id: ElectionId) -> Result<Option<Election>> {
        Ok(self.read()?.elections.get(&id).cloned())
    }

    fn elections(&self) -> Result<Vec<Election>> {
        Ok(self.read()?.elections.values().cloned().collect())
    }

    fn swap_election_status(
        &self,
        id: ElectionId,
        expected: ElectionStatus,
        new: ElectionStatus,
    ) -> Result<StatusSwap> {
        let mut tables = self.write()?;
        let Some(election) = tables.elections.get_mut(&id) else {
            return Ok(StatusSwap::Missing);
        };

        if election.status != expected {
            return Ok(StatusSwap::Stale(election.clone()));
        }

        election.status = new;
        election.updated_at = Utc::now();
        Ok(StatusSwap::Swapped(election.clone()))
    }

    fn insert_candidacy_if_absent(&self, candidacy: Candidacy) -> Result<InsertOutcome<Candidacy>> {
        let mut tables = self.write()?;
        let key = (candidacy.election_id, candidacy.identity_id);

        if let Some(existing) = tables
            .candidacy_index
            .get(&key)
            .and_then(|id| tables.candidacies.get(id))
        {
            return Ok(InsertOutcome::AlreadyExists(existing.clone()));
        }

        tables.candidacy_index.insert(key, candidacy.id);
        tables.candidacies.insert(candidacy.id, candidacy.clone());
        Ok(InsertOutcome::Inserted(candidacy))
    }

    fn link_candidacy(&self, election_id: ElectionId, candidacy_id: CandidacyId) -> Result<()> {
        let mut tables = self.write()?;
        let election = tables
            .elections
            .get_mut(&election_id)
            .ok_or_else(|| Error::not_found("Election", election_id))?;

        if !election.candidates.contains(&candidacy_id) {
            election.candidates.push(candidacy_id);
        }
        Ok(())
    }

    fn candidacy(&self, id: CandidacyId) -> Result<Option<Candidacy>> {
        Ok(self.read()?.candidacies.get(&id).cloned())
    }

    fn candidacies_for_election(&self, election_id: ElectionId) -> Result<Vec<Candidacy>> {
        Ok(self
            .read()?
            .candidacies
            .values()
            .filter(|c| c.election_id == election_id)
            .cloned()
            .collect())
    }

    fn candidacy_for(
        &self,
        election_id: ElectionId,
        identity_id: IdentityId,
    ) -> Result<Option<Candidacy>> {
        let tables = self.read()?;
        Ok(tables
            .candidacy_index
            .get(&(election_id, identity_id))
            .and_then(|id| tables.candidacies.get(id))
            .cloned())
    }

    fn insert_ballot_if_absent(&self, ballot: Ballot) -> Result<InsertOutcome<Ballot>> {
        Ok(self.write()?.insert_ballot(ballot))
    }

    fn increment_vote_count(&self, candidacy_id: CandidacyId) -> Result<u64> {
        self.write()?.increment(candidacy_id)
    }

    fn ballot_for(&self, election_id: ElectionId, voter_id: IdentityId) -> Result<Option<Ballot>> {
        let tables = self.read()?;
        Ok(tables
            .ballot_index
            .get(&(election_id, voter_id))
            .and_then(|id| tables.ballots.get(id))
            .cloned())
    }

    fn count_ballots_for_candidacy(&self, candidacy_id: CandidacyId) -> Result<u64> {
        Ok(self
            .read()?
            .ballots
            .values()
            .filter(|b| b.candidacy_id == candidacy_id)
            .count() as u64)
    }

    /// Status check, insert and link under one write lock
    fn register_candidacy(&self, candidacy: Candidacy) -> Result<InsertOutcome<Candidacy>> {
        let mut tables = self.write()?;
        let election = tables
            .elections
            .get(&candidacy.election_id)
            .ok_or_else(|| Error::not_found("Election", candidacy.election_id))?;
        require_status(election, ElectionStatus::Upcoming, "apply as candidate")?;

        let key = (candidacy.election_id, candidacy.identity_id);
        if let Some(existing) = tables
            .candidacy_index
            .get(&key)
            .and_then(|id| tables.candidacies.get(id))
        {
            return Ok(InsertOutcome::AlreadyExists(existing.clone()));
        }

        if let Some(election) = tables.elections.get_mut(&candidacy.election_id) {
            election.candidates.push(candidacy.id);
        }
        tables.candidacy_index.insert(key, candidacy.id);
        tables.candidacies.insert(candidacy.id, candidacy.clone());
        Ok(InsertOutcome::Inserted(candidacy))
    }

    /// Status check, insert and increment under one write lock
    fn record_ballot(&self, ballot: Ballot) -> Result<InsertOutcome<Ballot>> {
        let mut tables = self.write()?;
        if !tables.candidacies.contains_key(&ballot.candidacy_id) {
            return Err(Error::not_found("Candidacy", ballot.candidacy_id));
        }
        let election = tables
            .elections
            .get(&ballot.election_id)
            .ok_or_else(|| Error::not_found("Election", ballot.election_id))?;
        require_status(election, ElectionStatus::Active, "cast vote")?;

        let outcome = tables.insert_ballot(ballot);
        if let InsertOutcome::Inserted(ref recorded) = outcome {
            tables.increment(recorded.candidacy_id)?;
        }
        Ok(outcome)
    }
}

/// Authenticated caller for in-process use
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    identity: Option<Identity>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn sign_out(&mut self) {
        self.identity = None;
    }
}

impl IdentityProvider for Session {
    fn current_identity(&self) -> Result<Option<Identity>> {
        Ok(self.identity.clone())
    }
}
