//! The persistence seam between the voting components and the database.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{
    common::{CandidateId, PositionId, VoterId},
    db::{candidate::Candidate, position::Position, vote::NewVote, voter::Voter},
};

#[cfg(test)]
pub mod memory;
mod mongo;

pub use mongo::MongoStore;

/// The store as held in Rocket's managed state.
pub type Store = Arc<dyn BallotStore>;

/// Result of trying to commit a ballot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The votes were written and the voter marked as having voted.
    Committed,
    /// The voter could not be claimed: they were no longer active, had
    /// already voted, or a concurrent commit for them was in flight.
    /// Nothing was written.
    Unclaimed,
}

/// Vote counts for one position, as read from committed state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionVotes {
    /// Number of votes per candidate. Candidates without votes are absent.
    pub per_candidate: HashMap<CandidateId, u64>,
    /// Number of distinct voters with at least one vote for the position.
    pub voters: u64,
}

/// Everything the voting components need from the database.
///
/// Only [`BallotStore::commit_ballot`] writes. It must be atomic: either the
/// voter's `has_voted` flag is set and every vote is written, or nothing is.
#[rocket::async_trait]
pub trait BallotStore: Send + Sync {
    /// Look up a voter.
    async fn voter(&self, id: VoterId) -> Result<Option<Voter>>;

    /// Look up a position, whatever its status.
    async fn position(&self, id: PositionId) -> Result<Option<Position>>;

    /// All positions currently open for voting, ordered by ID.
    async fn open_positions(&self) -> Result<Vec<Position>>;

    /// All positions, open or closed, ordered by ID.
    async fn all_positions(&self) -> Result<Vec<Position>>;

    /// The active candidates standing for any of the given positions, ordered by ID.
    async fn active_candidates(&self, positions: &[PositionId]) -> Result<Vec<Candidate>>;

    /// Atomically claim the voter (set `has_voted` iff they are active and
    /// have not voted) and write their votes.
    async fn commit_ballot(&self, voter: VoterId, votes: &[NewVote]) -> Result<CommitOutcome>;

    /// Count the committed votes for a position.
    async fn position_votes(&self, position: PositionId) -> Result<PositionVotes>;
}
