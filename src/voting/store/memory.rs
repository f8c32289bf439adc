//! An in-memory [`BallotStore`] for tests. Commits are serialised behind a
//! mutex and staged, so an injected failure leaves no partial state. Clones
//! share the same state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use mongodb::bson::oid::ObjectId;

use crate::error::{Error, Result};
use crate::model::{
    common::{PositionId, VoterId},
    db::{
        candidate::Candidate,
        position::Position,
        vote::{NewVote, Vote, VoteCore},
        voter::Voter,
    },
};

use super::{BallotStore, CommitOutcome, PositionVotes};

#[derive(Default)]
struct State {
    voters: BTreeMap<VoterId, Voter>,
    positions: BTreeMap<PositionId, Position>,
    candidates: BTreeMap<u32, Candidate>,
    votes: Vec<Vote>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_voter(&self, voter: Voter) {
        self.state.lock().unwrap().voters.insert(voter.id, voter);
    }

    pub fn insert_position(&self, position: Position) {
        self.state
            .lock()
            .unwrap()
            .positions
            .insert(position.id, position);
    }

    pub fn insert_candidate(&self, candidate: Candidate) {
        self.state
            .lock()
            .unwrap()
            .candidates
            .insert(candidate.id, candidate);
    }

    /// Write votes directly, bypassing the ballot engine. For seeding tallies.
    pub fn insert_votes(&self, votes: impl IntoIterator<Item = VoteCore>) {
        let mut state = self.state.lock().unwrap();
        state.votes.extend(votes.into_iter().map(|vote| Vote {
            id: ObjectId::new(),
            vote,
        }));
    }

    /// Make the next commit fail half way through writing its votes.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Every vote committed for the given voter.
    pub fn votes_of(&self, voter: VoterId) -> Vec<VoteCore> {
        self.state
            .lock()
            .unwrap()
            .votes
            .iter()
            .filter(|vote| vote.voter_id == voter)
            .map(|vote| vote.vote)
            .collect()
    }

    pub fn total_votes(&self) -> usize {
        self.state.lock().unwrap().votes.len()
    }
}

#[rocket::async_trait]
impl BallotStore for MemoryStore {
    async fn voter(&self, id: VoterId) -> Result<Option<Voter>> {
        Ok(self.state.lock().unwrap().voters.get(&id).cloned())
    }

    async fn position(&self, id: PositionId) -> Result<Option<Position>> {
        Ok(self.state.lock().unwrap().positions.get(&id).cloned())
    }

    async fn open_positions(&self) -> Result<Vec<Position>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .positions
            .values()
            .filter(|position| position.is_open())
            .cloned()
            .collect())
    }

    async fn all_positions(&self) -> Result<Vec<Position>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .positions
            .values()
            .cloned()
            .collect())
    }

    async fn active_candidates(&self, positions: &[PositionId]) -> Result<Vec<Candidate>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .candidates
            .values()
            .filter(|candidate| candidate.is_active() && positions.contains(&candidate.position_id))
            .cloned()
            .collect())
    }

    async fn commit_ballot(&self, voter: VoterId, votes: &[NewVote]) -> Result<CommitOutcome> {
        let mut state = self.state.lock().unwrap();

        let claimable = state
            .voters
            .get(&voter)
            .map_or(false, |v| v.is_active() && !v.has_voted);
        if !claimable {
            return Ok(CommitOutcome::Unclaimed);
        }

        // Stage everything, and only publish once the whole ballot is written.
        let mut staged = state.votes.clone();
        for (written, vote) in votes.iter().enumerate() {
            if written == votes.len() / 2 && self.fail_next_commit.swap(false, Ordering::SeqCst) {
                return Err(Error::Storage(format!(
                    "injected failure after {written} of {} votes",
                    votes.len()
                )));
            }
            staged.push(Vote {
                id: ObjectId::new(),
                vote: *vote,
            });
        }
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(Error::Storage("injected failure before commit".to_string()));
        }

        state.votes = staged;
        if let Some(v) = state.voters.get_mut(&voter) {
            v.has_voted = true;
        }
        Ok(CommitOutcome::Committed)
    }

    async fn position_votes(&self, position: PositionId) -> Result<PositionVotes> {
        let state = self.state.lock().unwrap();
        let mut per_candidate = HashMap::new();
        let mut voters = HashSet::new();
        for vote in state.votes.iter().filter(|v| v.position_id == position) {
            *per_candidate.entry(vote.candidate_id).or_insert(0) += 1;
            voters.insert(vote.voter_id);
        }
        Ok(PositionVotes {
            per_candidate,
            voters: voters.len() as u64,
        })
    }
}

/// Example data for tests.
mod examples {
    use super::*;
    use crate::model::db::voter::VoterCore;

    impl MemoryStore {
        /// A small election:
        ///
        /// - President (1 seat): Ada Lovelace (10), Grace Hopper (11), and
        ///   the withdrawn Alan Turing (12).
        /// - Councilor (2 seats): Edsger Dijkstra (20), Barbara Liskov (21),
        ///   Donald Knuth (22).
        /// - Auditor (1 seat, closed): Ken Thompson (30).
        /// - Voters 1 to 5 active, voter 6 inactive.
        pub fn example() -> Self {
            let store = Self::new();

            store.insert_position(Position::example(1, "President", 1));
            store.insert_position(Position::example(2, "Councilor", 2));
            store.insert_position(Position::closed_example(3, "Auditor", 1));

            store.insert_candidate(Candidate::example(10, 1, "Ada Lovelace"));
            store.insert_candidate(Candidate::example(11, 1, "Grace Hopper"));
            store.insert_candidate(Candidate::inactive_example(12, 1, "Alan Turing"));
            store.insert_candidate(Candidate::example(20, 2, "Edsger Dijkstra"));
            store.insert_candidate(Candidate::example(21, 2, "Barbara Liskov"));
            store.insert_candidate(Candidate::example(22, 2, "Donald Knuth"));
            store.insert_candidate(Candidate::example(30, 3, "Ken Thompson"));

            // Hashing is slow, so every example voter shares one hash.
            let template = Voter::example(0);
            for id in 1..=6 {
                let mut voter = Voter::new(
                    id,
                    VoterCore {
                        name: format!("Voter {id}"),
                        ..template.voter.clone()
                    },
                );
                if id == 6 {
                    voter.status = crate::model::common::VoterStatus::Inactive;
                }
                store.insert_voter(voter);
            }

            store
        }
    }
}
