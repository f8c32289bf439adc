use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// Whether a voter may take part in the election at all.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoterStatus {
    Active,
    Inactive,
}

/// Whether a position is currently accepting votes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    /// Votable, and included in tallies.
    Open,
    /// Frozen: no longer votable or tallied.
    Closed,
}

/// Whether a candidate is still standing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Active,
    Inactive,
}

impl From<VoterStatus> for Bson {
    fn from(status: VoterStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

impl From<PositionStatus> for Bson {
    fn from(status: PositionStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

impl From<CandidateStatus> for Bson {
    fn from(status: CandidateStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}
