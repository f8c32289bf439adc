use serde::{Deserialize, Serialize};

use crate::model::{
    common::{VoterId, VoterStatus},
    db::voter::Voter,
};

/// What a signed-in voter is told about themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterSummary {
    pub voter_id: VoterId,
    pub name: String,
    pub status: VoterStatus,
    pub has_voted: bool,
}

impl From<&Voter> for VoterSummary {
    fn from(voter: &Voter) -> Self {
        Self {
            voter_id: voter.id,
            name: voter.name.clone(),
            status: voter.status,
            has_voted: voter.has_voted,
        }
    }
}
