//! Caller-facing election service
//!
//! Every command resolves the current identity, gathers the facts the gate
//! needs, asks the gate, and only then hands off to the lifecycle manager,
//! candidacy registry, or ballot ledger. The uniqueness checks are repeated
//! by the store on write, so a request that passes the gate concurrently
//! with a duplicate still fails cleanly.

use crate::auth::{self, AccessContext, Operation};
use crate::config::LifecycleConfig;
use crate::ledger::BallotLedger;
use crate::lifecycle::{LifecycleManager, StatusCounts};
use crate::registry::CandidacyRegistry;
use crate::results::{ElectionResults, ResultsTabulator};
use crate::store::{IdentityProvider, RecordStore};
use crate::types::{
    Ballot, Candidacy, CandidacyId, Election, ElectionId, ElectionStatus, Identity,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct ElectionService {
    lifecycle: LifecycleManager,
    registry: CandidacyRegistry,
    ledger: BallotLedger,
    tabulator: ResultsTabulator,
}

impl ElectionService {
    pub fn new(store: Arc<dyn RecordStore>, config: LifecycleConfig) -> Self {
        Self {
            lifecycle: LifecycleManager::new(store.clone(), config),
            registry: CandidacyRegistry::new(store.clone()),
            ledger: BallotLedger::new(store.clone()),
            tabulator: ResultsTabulator::new(store),
        }
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn registry(&self) -> &CandidacyRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &BallotLedger {
        &self.ledger
    }

    pub fn create_election(
        &self,
        caller: &dyn IdentityProvider,
        title: &str,
        description: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Election> {
        let admin = admit(
            caller.current_identity()?,
            Operation::CreateElection,
            AccessContext::default(),
        )?;
        self.lifecycle
            .create(title, description, start_time, end_time, admin.id)
    }

    pub fn transition_election(
        &self,
        caller: &dyn IdentityProvider,
        election_id: ElectionId,
        new_status: ElectionStatus,
    ) -> Result<Election> {
        admit(
            caller.current_identity()?,
            Operation::TransitionElection,
            AccessContext::default(),
        )?;
        self.lifecycle.transition(election_id, new_status)
    }

    pub fn apply_as_candidate(
        &self,
        caller: &dyn IdentityProvider,
        election_id: ElectionId,
        position: &str,
    ) -> Result<Candidacy> {
        let identity = caller.current_identity()?;
        let election = self.lifecycle.election(election_id)?;

        let has_candidacy = match &identity {
            Some(identity) => self
                .registry
                .candidacy_for(election_id, identity.id)?
                .is_some(),
            None => false,
        };
        let context = AccessContext::for_election(&election).with_candidacy(has_candidacy);

        let candidate = admit(identity, Operation::ApplyAsCandidate, context)?;
        self.registry.apply(candidate.id, election_id, position)
    }

    pub fn cast_vote(
        &self,
        caller: &dyn IdentityProvider,
        election_id: ElectionId,
        candidacy_id: CandidacyId,
    ) -> Result<Ballot> {
        let identity = caller.current_identity()?;
        let election = self.lifecycle.election(election_id)?;

        let has_ballot = match &identity {
            Some(identity) => self.ledger.has_voted(election_id, identity.id)?,
            None => false,
        };
        let context = AccessContext::for_election(&election).with_ballot(has_ballot);

        let voter = admit(identity, Operation::CastVote, context)?;
        self.ledger.cast_vote(election_id, candidacy_id, voter.id)
    }

    /// Whether the caller has voted in an election
    pub fn has_voted(&self, caller: &dyn IdentityProvider, election_id: ElectionId) -> Result<bool> {
        let identity = caller
            .current_identity()?
            .ok_or_else(|| Error::not_authorized("no authenticated identity"))?;
        self.ledger.has_voted(election_id, identity.id)
    }

    pub fn view_results(
        &self,
        caller: &dyn IdentityProvider,
        election_id: ElectionId,
    ) -> Result<ElectionResults> {
        let identity = caller.current_identity()?;
        let election = self.lifecycle.election(election_id)?;

        admit(
            identity,
            Operation::ViewResults,
            AccessContext::for_election(&election),
        )?;
        self.tabulator.tabulate(election_id)
    }

    pub fn list_elections(&self, status: Option<ElectionStatus>) -> Result<Vec<Election>> {
        self.lifecycle.list(status)
    }

    pub fn status_counts(&self) -> Result<StatusCounts> {
        self.lifecycle.status_counts()
    }

    pub fn candidacies(&self, election_id: ElectionId) -> Result<Vec<Candidacy>> {
        self.registry.candidacies(election_id)
    }
}

/// Run the gate and hand back the admitted identity
fn admit(
    identity: Option<Identity>,
    operation: Operation,
    context: AccessContext<'_>,
) -> Result<Identity> {
    if let Err(err) = auth::require(identity.as_ref(), operation, context) {
        tracing::warn!("🔐 Denied {}: {}", operation, err);
        return Err(err);
    }
    identity.ok_or_else(|| Error::not_authorized("no authenticated identity"))
}
