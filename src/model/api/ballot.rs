use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, PositionId, VoterId};

/// A ballot as submitted by a voter: for each position, the candidates they
/// selected. Positions left out are abstentions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSpec {
    #[serde(default)]
    pub selections: BTreeMap<PositionId, Vec<CandidateId>>,
}

/// What a voter is shown before filling in their ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotForm {
    pub voter_id: VoterId,
    pub voter_name: String,
    pub positions: Vec<BallotFormPosition>,
}

/// One open position on the ballot form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotFormPosition {
    pub id: PositionId,
    pub name: String,
    /// Maximum number of candidates the voter may select.
    pub seat_count: u32,
    pub candidates: Vec<BallotFormCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotFormCandidate {
    pub id: CandidateId,
    pub name: String,
}

/// Confirmation of a committed ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub voter_id: VoterId,
    /// Number of vote rows written.
    pub votes_recorded: usize,
    /// Positions with at least one selection, in ID order.
    pub positions_voted: Vec<PositionId>,
    /// Open positions the voter left blank, in ID order.
    pub positions_abstained: Vec<PositionId>,
}
