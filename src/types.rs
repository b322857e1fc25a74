//! # Core Types for the Election Core
//!
//! This module defines the records the election core reads and writes through
//! the record store. The store owns every record; services only ever hold
//! transient copies for the duration of one operation.
//!
//! ## Type Categories
//!
//! ### Identities
//! - [`Role`]: Fixed role assigned at registration
//! - [`Identity`]: An authenticated person as seen by the core
//!
//! ### Core Entities
//! - [`Election`]: A time-boxed contest with a lifecycle status
//! - [`Candidacy`]: One person's participation in one election
//! - [`Ballot`]: One voter's single, immutable vote
//! - [`BallotReceipt`]: A digest the voter can keep to confirm their ballot
//!
//! ## Usage Examples
//!
//! ```rust
//! use election_core::types::ElectionStatus;
//!
//! let status = ElectionStatus::Upcoming;
//! assert_eq!(status.next(), Some(ElectionStatus::Active));
//! assert!(ElectionStatus::Completed.is_terminal());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of an [`Election`]
pub type ElectionId = Uuid;

/// Identifier of an [`Identity`]
pub type IdentityId = Uuid;

/// Identifier of a [`Candidacy`]
pub type CandidacyId = Uuid;

/// Identifier of a [`Ballot`]
pub type BallotId = Uuid;

/// Role of an identity
///
/// Assigned once at registration and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Voter,
    Candidate,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Voter => "voter",
            Role::Candidate => "candidate",
        };
        f.write_str(name)
    }
}

/// An authenticated person
///
/// Identities belong to the external identity collaborator. The core reads
/// them to authorize operations and to copy a candidate's display name onto
/// their candidacy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    /// Create a new identity with a fresh id
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Lifecycle status of an election
///
/// Elections progress through distinct phases, strictly forward:
/// 1. **Upcoming**: Created, accepting candidate applications
/// 2. **Active**: Accepting ballots
/// 3. **Completed**: Closed; results may be published
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    Upcoming,
    Active,
    Completed,
}

impl ElectionStatus {
    /// All statuses in lifecycle order
    pub const ALL: [ElectionStatus; 3] = [
        ElectionStatus::Upcoming,
        ElectionStatus::Active,
        ElectionStatus::Completed,
    ];

    /// The status one step further along, if any
    pub fn next(self) -> Option<ElectionStatus> {
        match self {
            ElectionStatus::Upcoming => Some(ElectionStatus::Active),
            ElectionStatus::Active => Some(ElectionStatus::Completed),
            ElectionStatus::Completed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ElectionStatus::Completed
    }
}

impl fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElectionStatus::Upcoming => "upcoming",
            ElectionStatus::Active => "active",
            ElectionStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Election information and metadata
///
/// An `Election` is created by an admin in the `Upcoming` status and then
/// moved forward by the lifecycle manager. The time window is recorded at
/// creation but does not drive the status unless automatic transitions are
/// enabled.
///
/// # Examples
///
/// ```rust
/// use election_core::types::{Election, ElectionStatus};
/// use chrono::{Duration, Utc};
/// use uuid::Uuid;
///
/// let now = Utc::now();
/// let election = Election::new(
///     "Student Council 2026".to_string(),
///     "Annual council election".to_string(),
///     now + Duration::hours(1),
///     now + Duration::hours(2),
///     Uuid::new_v4(),
/// );
///
/// assert_eq!(election.status, ElectionStatus::Upcoming);
/// assert!(election.candidates.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Election {
    /// Unique election identifier
    pub id: ElectionId,

    /// Human-readable election title
    pub title: String,

    /// Detailed election description shown to voters
    pub description: String,

    /// Current lifecycle status
    ///
    /// Mutated only by the lifecycle manager, and only forward.
    pub status: ElectionStatus,

    /// Nominal start of voting
    pub start_time: DateTime<Utc>,

    /// Nominal end of voting, always after `start_time`
    pub end_time: DateTime<Utc>,

    /// Candidacies admitted to this election, in application order
    ///
    /// A denormalized index for display. The candidacy collection in the
    /// store is the source of truth.
    pub candidates: Vec<CandidacyId>,

    /// Admin who created the election
    pub created_by: IdentityId,

    pub created_at: DateTime<Utc>,

    /// Last status change
    pub updated_at: DateTime<Utc>,
}

impl Election {
    /// Build a new upcoming election. Input is not validated here.
    pub fn new(
        title: String,
        description: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        created_by: IdentityId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            status: ElectionStatus::Upcoming,
            start_time,
            end_time,
            candidates: Vec::new(),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the nominal voting window contains `now`
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time && now < self.end_time
    }
}

/// A person's registered participation in one election
///
/// At most one candidacy exists per `(election_id, identity_id)` pair. The
/// `vote_count` starts at zero and is changed only by the store's atomic
/// increment when a ballot is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidacy {
    pub id: CandidacyId,
    pub election_id: ElectionId,
    pub identity_id: IdentityId,

    /// Display name copied from the identity at application time
    pub name: String,

    /// Position the candidate is standing for
    pub position: String,

    /// Number of ballots cast for this candidacy
    pub vote_count: u64,

    /// When the application was accepted; used to break ties in results
    pub applied_at: DateTime<Utc>,
}

impl Candidacy {
    pub fn new(
        election_id: ElectionId,
        identity_id: IdentityId,
        name: String,
        position: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            election_id,
            identity_id,
            name,
            position,
            vote_count: 0,
            applied_at: Utc::now(),
        }
    }
}

/// One voter's vote in one election
///
/// Created exactly once per `(election_id, voter_id)` pair and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub id: BallotId,
    pub election_id: ElectionId,
    pub candidacy_id: CandidacyId,
    pub voter_id: IdentityId,
    pub cast_at: DateTime<Utc>,
}

impl Ballot {
    pub fn new(election_id: ElectionId, candidacy_id: CandidacyId, voter_id: IdentityId) -> Self {
        Self {
            id: Uuid::new_v4(),
            election_id,
            candidacy_id,
            voter_id,
            cast_at: Utc::now(),
        }
    }

    /// Compute the receipt for this ballot
    ///
    /// The digest covers the ballot id, election, candidacy, voter and cast
    /// time. Recomputing it from the stored ballot and comparing shows the
    /// ballot was recorded unchanged.
    ///
    /// ```rust
    /// use election_core::types::Ballot;
    /// use uuid::Uuid;
    ///
    /// let ballot = Ballot::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    /// let receipt = ballot.receipt();
    ///
    /// assert_eq!(receipt.ballot_id, ballot.id);
    /// assert!(receipt.matches(&ballot));
    /// ```
    pub fn receipt(&self) -> BallotReceipt {
        BallotReceipt {
            ballot_id: self.id,
            election_id: self.election_id,
            digest: hex::encode(self.digest()),
        }
    }

    fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.id.as_bytes());
        hasher.update(self.election_id.as_bytes());
        hasher.update(self.candidacy_id.as_bytes());
        hasher.update(self.voter_id.as_bytes());
        hasher.update(&self.cast_at.timestamp_micros().to_le_bytes());
        hasher.finalize().into()
    }
}

/// Proof-of-recording handed back to a voter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotReceipt {
    pub ballot_id: BallotId,
    pub election_id: ElectionId,

    /// Hex-encoded blake3 digest of the ballot
    pub digest: String,
}

impl BallotReceipt {
    /// Check this receipt against a stored ballot
    pub fn matches(&self, ballot: &Ballot) -> bool {
        self.ballot_id == ballot.id && self.digest == hex::encode(ballot.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_progression() {
        assert_eq!(ElectionStatus::Upcoming.next(), Some(ElectionStatus::Active));
        assert_eq!(ElectionStatus::Active.next(), Some(ElectionStatus::Completed));
        assert_eq!(ElectionStatus::Completed.next(), None);

        assert!(ElectionStatus::Upcoming < ElectionStatus::Active);
        assert!(ElectionStatus::Active < ElectionStatus::Completed);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ElectionStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");

        let role: Role = serde_json::from_str("\"candidate\"").unwrap();
        assert_eq!(role, Role::Candidate);
    }

    #[test]
    fn test_election_window() {
        let now = Utc::now();
        let election = Election::new(
            "Board".to_string(),
            "Board election".to_string(),
            now + Duration::hours(1),
            now + Duration::hours(2),
            Uuid::new_v4(),
        );

        assert!(!election.window_contains(now));
        assert!(election.window_contains(now + Duration::minutes(90)));
        assert!(!election.window_contains(now + Duration::hours(2)));
    }

    #[test]
    fn test_receipt_detects_tampering() {
        let ballot = Ballot::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let receipt = ballot.receipt();
        assert!(receipt.matches(&ballot));
        assert_eq!(receipt.digest.len(), 64);

        let tampered = Ballot {
            candidacy_id: Uuid::new_v4(),
            ..ballot.clone()
        };
        assert!(!receipt.matches(&tampered));
    }

    #[test]
    fn test_new_candidacy_starts_at_zero() {
        let candidacy = Candidacy::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Alice".to_string(),
            "President".to_string(),
        );
        assert_eq!(candidacy.vote_count, 0);
    }
}
