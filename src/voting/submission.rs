use log::{debug, info, warn};

use crate::error::{BallotError, Error, Result};
use crate::model::{
    api::ballot::{BallotSpec, Receipt},
    common::VoterId,
};

use super::{
    ballot::{Ballot, BallotLayout},
    guard::{authorize, check_eligible},
    store::{BallotStore, CommitOutcome},
};

/// Validate and commit one voter's ballot.
///
/// Nothing is written unless every position in the ballot is valid, and the
/// votes and the voter's `has_voted` flag are committed together or not at
/// all. Of several concurrent submissions for the same voter, at most one
/// commits; the others fail with [`BallotError::AlreadyVoted`]. If the commit
/// is refused while the voter is still eligible, nothing was written and the
/// ballot can be resubmitted.
pub async fn submit(store: &dyn BallotStore, voter_id: VoterId, spec: &BallotSpec) -> Result<Receipt> {
    // Re-check eligibility against stored state, never the session.
    let voter = authorize(store, Some(voter_id)).await?;

    let layout = BallotLayout::load(store).await?;
    let ballot = Ballot::validate(spec, &layout).map_err(|err| {
        debug!("Rejected ballot from voter {voter_id}: {err}");
        err
    })?;

    let votes = ballot.votes(voter.id);
    match store.commit_ballot(voter.id, &votes).await? {
        CommitOutcome::Committed => {}
        CommitOutcome::Unclaimed => {
            // Find out why, so the voter gets the precise reason.
            warn!("Commit refused for voter {voter_id}");
            let err = match store.voter(voter_id).await? {
                Some(voter) => match check_eligible(&voter) {
                    Err(err) => err.into(),
                    Ok(()) => Error::Storage(format!(
                        "commit for eligible voter {voter_id} was not applied"
                    )),
                },
                None => BallotError::NotAuthenticated.into(),
            };
            return Err(err);
        }
    }

    let positions_voted = ballot.positions_voted();
    let positions_abstained = layout
        .position_ids()
        .filter(|id| !positions_voted.contains(id))
        .collect();
    info!(
        "Voter {voter_id} cast a ballot: {} votes across {} positions",
        votes.len(),
        positions_voted.len()
    );
    Ok(Receipt {
        voter_id,
        votes_recorded: votes.len(),
        positions_voted,
        positions_abstained,
    })
}
