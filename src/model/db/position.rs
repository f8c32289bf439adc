use std::num::NonZeroU32;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::model::common::{PositionId, PositionStatus};

/// Core position data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCore {
    pub name: String,
    pub status: PositionStatus,
    /// How many winners this position elects, which also bounds how many
    /// candidates a single voter may select for it.
    pub seat_count: NonZeroU32,
}

impl PositionCore {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// The seat-count as a selection bound.
    pub fn seats(&self) -> usize {
        self.seat_count.get() as usize
    }
}

/// A position from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "_id")]
    pub id: PositionId,
    #[serde(flatten)]
    pub position: PositionCore,
}

impl Deref for Position {
    type Target = PositionCore;

    fn deref(&self) -> &Self::Target {
        &self.position
    }
}
