use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, PositionId};

/// One candidate's line in a position tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub candidate_id: CandidateId,
    pub name: String,
    pub votes: u64,
    /// Share of the position's voters who selected this candidate, in percent.
    pub percentage: f64,
}

/// Vote totals for one position, ordered by votes descending then candidate
/// ID ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionTally {
    pub position_id: PositionId,
    pub name: String,
    pub seat_count: u32,
    /// Distinct voters who selected at least one candidate for this position.
    pub voters: u64,
    pub entries: Vec<TallyEntry>,
}

/// The elected candidates of one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Winners {
    pub position_id: PositionId,
    pub seat_count: u32,
    /// At most `seat_count` entries, in tally order.
    pub winners: Vec<TallyEntry>,
    /// Candidates sharing the vote count at the last seat, when that tie
    /// straddles the cutoff. Empty when the result is unambiguous.
    pub tied_at_cutoff: Vec<CandidateId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionResults {
    pub tally: PositionTally,
    pub winners: Winners,
}
