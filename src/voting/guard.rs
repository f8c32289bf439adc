use crate::error::{BallotError, Result};
use crate::model::{common::VoterId, db::voter::Voter};

use super::store::BallotStore;

/// Decide whether the voter behind a session may cast a ballot right now.
///
/// Always reads the voter afresh; a session only proves who the voter is,
/// never that they are still eligible.
pub async fn authorize(store: &dyn BallotStore, session: Option<VoterId>) -> Result<Voter> {
    let voter_id = session.ok_or(BallotError::NotAuthenticated)?;
    let voter = store
        .voter(voter_id)
        .await?
        .ok_or(BallotError::NotAuthenticated)?;
    check_eligible(&voter)?;
    Ok(voter)
}

/// Eligibility of an already loaded voter.
pub fn check_eligible(voter: &Voter) -> std::result::Result<(), BallotError> {
    if voter.has_voted {
        return Err(BallotError::AlreadyVoted(voter.id));
    }
    if !voter.is_active() {
        return Err(BallotError::Inactive(voter.id));
    }
    Ok(())
}
