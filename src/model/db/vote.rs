use std::ops::Deref;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, PositionId, VoterId};

/// One selection of one candidate by one voter. Votes are written once, when
/// the ballot containing them is committed, and never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteCore {
    pub voter_id: VoterId,
    pub candidate_id: CandidateId,
    /// Denormalised from the candidate, so tallies can filter on it directly.
    pub position_id: PositionId,
}

/// A vote ready for insertion; the database assigns the ID.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}
