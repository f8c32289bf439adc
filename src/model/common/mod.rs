mod status;

pub use status::{CandidateStatus, PositionStatus, VoterStatus};

/// Our voter IDs are integers, issued by the registration office.
pub type VoterId = u32;
/// Our position IDs are integers.
pub type PositionId = u32;
/// Our candidate IDs are integers.
pub type CandidateId = u32;
