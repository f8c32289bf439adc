use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, CandidateStatus, PositionId};

/// Core candidate data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    /// The single position this candidate stands for.
    pub position_id: PositionId,
    pub first_name: String,
    pub last_name: String,
    pub status: CandidateStatus,
}

impl CandidateCore {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == CandidateStatus::Active
    }
}

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}
