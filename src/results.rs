//! Results tabulator
//!
//! A read-side projection over the candidacies of a completed election.
//! Standings are ordered by vote count, highest first; equal counts are
//! ordered by application time and then candidacy id, so the order never
//! depends on how the store happened to return rows.

use crate::store::RecordStore;
use crate::types::{Candidacy, CandidacyId, ElectionId, ElectionStatus};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// One candidacy's place in the results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based position after sorting
    pub rank: usize,
    pub candidacy_id: CandidacyId,
    pub name: String,
    pub position: String,
    pub vote_count: u64,

    /// Share of all votes, rounded to the nearest whole percent
    pub percentage: u64,
}

/// Official results of a completed election
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    pub election_id: ElectionId,
    pub title: String,
    pub total_votes: u64,
    pub standings: Vec<Standing>,
}

impl ElectionResults {
    /// The first standing, or `None` when nobody stood
    ///
    /// A tie for first is not resolved here; see [`ElectionResults::tied_for_first`].
    pub fn winner(&self) -> Option<&Standing> {
        self.standings.first()
    }

    /// Whether the top two standings share a vote count
    pub fn tied_for_first(&self) -> bool {
        match self.standings.as_slice() {
            [first, second, ..] => first.vote_count == second.vote_count,
            _ => false,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `votes / total * 100`, rounded half up; zero when there are no votes
pub fn percentage(votes: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let (votes, total) = (u128::from(votes), u128::from(total));
    u64::try_from((votes * 200 + total) / (total * 2)).unwrap_or(u64::MAX)
}

/// Sort candidacies into ranked standings
pub fn rank(mut candidacies: Vec<Candidacy>) -> Vec<Standing> {
    candidacies.sort_by(compare_standing);
    let total: u64 = candidacies.iter().map(|c| c.vote_count).sum();

    candidacies
        .into_iter()
        .enumerate()
        .map(|(index, c)| Standing {
            rank: index + 1,
            candidacy_id: c.id,
            percentage: percentage(c.vote_count, total),
            name: c.name,
            position: c.position,
            vote_count: c.vote_count,
        })
        .collect()
}

fn compare_standing(a: &Candidacy, b: &Candidacy) -> Ordering {
    b.vote_count
        .cmp(&a.vote_count)
        .then(a.applied_at.cmp(&b.applied_at))
        .then(a.id.cmp(&b.id))
}

pub struct ResultsTabulator {
    store: Arc<dyn RecordStore>,
}

impl ResultsTabulator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Official results; only available once the election is completed
    pub fn tabulate(&self, election_id: ElectionId) -> Result<ElectionResults> {
        let election = self
            .store
            .election(election_id)?
            .ok_or_else(|| Error::not_found("Election", election_id))?;

        if election.status != ElectionStatus::Completed {
            return Err(Error::invalid_state(
                election_id,
                election.status,
                "publish results",
            ));
        }

        let standings = rank(self.store.candidacies_for_election(election_id)?);
        let total_votes = standings.iter().map(|s| s.vote_count).sum();

        tracing::debug!(
            "📊 Tabulated election {}: {} candidacies, {} votes",
            election_id,
            standings.len(),
            total_votes
        );

        Ok(ElectionResults {
            election_id,
            title: election.title,
            total_votes,
            standings,
        })
    }
}
