//! Election lifecycle manager
//!
//! Owns election creation and status transitions. Status only ever moves
//! forward (`upcoming → active → completed`); how far a single transition may
//! jump is set by the [`TransitionPolicy`].

use crate::config::LifecycleConfig;
use crate::store::{RecordStore, StatusSwap};
use crate::types::{Election, ElectionId, ElectionStatus, IdentityId};
use crate::{Error, Result, validation_error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// How far one transition may move an election
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Exactly one step forward
    #[default]
    Adjacent,

    /// Any forward jump, including `upcoming → completed`
    Forward,
}

impl TransitionPolicy {
    pub fn permits(self, from: ElectionStatus, to: ElectionStatus) -> bool {
        match self {
            TransitionPolicy::Adjacent => from.next() == Some(to),
            TransitionPolicy::Forward => to > from,
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adjacent" => Ok(TransitionPolicy::Adjacent),
            "forward" => Ok(TransitionPolicy::Forward),
            other => Err(Error::config(format!("unknown transition policy '{other}'"))),
        }
    }
}

/// Number of elections in each status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub upcoming: usize,
    pub active: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.upcoming + self.active + self.completed
    }
}

/// Creates elections and moves them through their lifecycle
pub struct LifecycleManager {
    store: Arc<dyn RecordStore>,
    config: LifecycleConfig,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn RecordStore>, config: LifecycleConfig) -> Self {
        Self { store, config }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.config.transition_policy
    }

    /// Create a new election in the `upcoming` status
    ///
    /// Fails with a validation error when the title or description is empty,
    /// the title is too long, `start_time` is not strictly in the future, or
    /// `end_time` does not follow `start_time`.
    pub fn create(
        &self,
        title: &str,
        description: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        creator_id: IdentityId,
    ) -> Result<Election> {
        let title = title.trim();
        let description = description.trim();

        if title.is_empty() {
            return Err(validation_error!("title", "must not be empty"));
        }
        if title.chars().count() > self.config.max_title_length {
            return Err(validation_error!(
                "title",
                "must be at most {} characters",
                self.config.max_title_length
            ));
        }
        if description.is_empty() {
            return Err(validation_error!("description", "must not be empty"));
        }
        if start_time <= Utc::now() {
            return Err(validation_error!("start_time", "must be in the future"));
        }
        if end_time <= start_time {
            return Err(validation_error!("end_time", "must be after start_time"));
        }

        let election = Election::new(
            title.to_string(),
            description.to_string(),
            start_time,
            end_time,
            creator_id,
        );
        self.store.insert_election(election.clone())?;

        tracing::info!(
            "🗓️ Election created: id={}, title={:?}, starts={}, ends={}",
            election.id,
            election.title,
            election.start_time,
            election.end_time
        );

        Ok(election)
    }

    /// Move an election to `new_status`
    ///
    /// The status write is a compare-and-set against the status that was
    /// validated, so a concurrent transition cannot be overwritten. Time
    /// bounds are not consulted.
    pub fn transition(&self, election_id: ElectionId, new_status: ElectionStatus) -> Result<Election> {
        let election = self.election(election_id)?;
        let current = election.status;

        if !self.config.transition_policy.permits(current, new_status) {
            tracing::warn!(
                "⛔ Rejected transition for election {}: {} -> {}",
                election_id,
                current,
                new_status
            );
            return Err(Error::InvalidTransition {
                from: current,
                to: new_status,
            });
        }

        match self.store.swap_election_status(election_id, current, new_status)? {
            StatusSwap::Swapped(updated) => {
                tracing::info!(
                    "🔄 Election {} transitioned: {} -> {}",
                    election_id,
                    current,
                    new_status
                );
                Ok(updated)
            }
            StatusSwap::Stale(latest) => {
                tracing::warn!(
                    "⛔ Transition for election {} lost a race: now {}, wanted {}",
                    election_id,
                    latest.status,
                    new_status
                );
                Err(Error::InvalidTransition {
                    from: latest.status,
                    to: new_status,
                })
            }
            StatusSwap::Missing => Err(Error::not_found("Election", election_id)),
        }
    }

    /// Move an election one step forward
    pub fn advance(&self, election_id: ElectionId) -> Result<Election> {
        let election = self.election(election_id)?;
        let next = election.status.next().ok_or(Error::InvalidTransition {
            from: election.status,
            to: election.status,
        })?;
        self.transition(election_id, next)
    }

    pub fn election(&self, election_id: ElectionId) -> Result<Election> {
        self.store
            .election(election_id)?
            .ok_or_else(|| Error::not_found("Election", election_id))
    }

    /// Elections ordered by start time, optionally restricted to one status
    pub fn list(&self, status: Option<ElectionStatus>) -> Result<Vec<Election>> {
        let mut elections: Vec<Election> = self
            .store
            .elections()?
            .into_iter()
            .filter(|e| status.is_none_or(|s| e.status == s))
            .collect();
        elections.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(elections)
    }

    pub fn status_counts(&self) -> Result<StatusCounts> {
        let mut counts = StatusCounts::default();
        for election in self.store.elections()? {
            match election.status {
                ElectionStatus::Upcoming => counts.upcoming += 1,
                ElectionStatus::Active => counts.active += 1,
                ElectionStatus::Completed => counts.completed += 1,
            }
        }
        Ok(counts)
    }
}
