//! Read-only aggregation of committed votes into totals and winners.

use std::cmp::Reverse;

use crate::error::{Error, Result};
use crate::model::{
    api::results::{PositionResults, PositionTally, TallyEntry, Winners},
    common::PositionId,
    db::{candidate::Candidate, position::Position},
};

use super::store::{BallotStore, PositionVotes};

/// Tally an open position.
pub async fn tally(store: &dyn BallotStore, position_id: PositionId) -> Result<PositionTally> {
    let position = store
        .position(position_id)
        .await?
        .filter(|position| position.is_open())
        .ok_or(Error::PositionNotFound(position_id))?;
    tally_position(store, &position).await
}

/// Winners of an open position.
pub async fn winners(store: &dyn BallotStore, position_id: PositionId) -> Result<Winners> {
    Ok(resolve_winners(&tally(store, position_id).await?))
}

/// Tally and winners for every open position, ordered by position ID.
pub async fn results(store: &dyn BallotStore) -> Result<Vec<PositionResults>> {
    let positions = store.open_positions().await?;
    results_for(store, &positions).await
}

/// Tally and winners for the given positions, whatever their status.
pub async fn results_for(
    store: &dyn BallotStore,
    positions: &[Position],
) -> Result<Vec<PositionResults>> {
    let mut results = Vec::with_capacity(positions.len());
    for position in positions {
        let tally = tally_position(store, position).await?;
        let winners = resolve_winners(&tally);
        results.push(PositionResults { tally, winners });
    }
    Ok(results)
}

/// Tally a position without checking its status.
pub async fn tally_position(store: &dyn BallotStore, position: &Position) -> Result<PositionTally> {
    let candidates = store.active_candidates(&[position.id]).await?;
    let votes = store.position_votes(position.id).await?;
    Ok(build_tally(position, &candidates, &votes))
}

/// Combine a position's active candidates with its vote counts.
///
/// Votes for candidates not in `candidates` are ignored, but their voters
/// still count towards the percentage base.
pub fn build_tally(
    position: &Position,
    candidates: &[Candidate],
    votes: &PositionVotes,
) -> PositionTally {
    let mut entries: Vec<_> = candidates
        .iter()
        .filter(|candidate| candidate.position_id == position.id)
        .map(|candidate| {
            let count = votes.per_candidate.get(&candidate.id).copied().unwrap_or(0);
            TallyEntry {
                candidate_id: candidate.id,
                name: candidate.full_name(),
                votes: count,
                percentage: percentage(count, votes.voters),
            }
        })
        .collect();
    entries.sort_by_key(|entry| (Reverse(entry.votes), entry.candidate_id));

    PositionTally {
        position_id: position.id,
        name: position.name.clone(),
        seat_count: position.seat_count.get(),
        voters: votes.voters,
        entries,
    }
}

/// Pick the winners from a tally.
///
/// Takes the first `seat_count` entries with at least one vote. A tie for the
/// last seat is settled by the tally order (lower candidate ID first), and the
/// candidates involved are listed in `tied_at_cutoff`.
pub fn resolve_winners(tally: &PositionTally) -> Winners {
    let seats = tally.seat_count as usize;
    let contenders: Vec<&TallyEntry> = tally.entries.iter().filter(|e| e.votes > 0).collect();

    let tied_at_cutoff = match (contenders.get(seats.wrapping_sub(1)), contenders.get(seats)) {
        (Some(last_in), Some(first_out)) if last_in.votes == first_out.votes => contenders
            .iter()
            .filter(|entry| entry.votes == last_in.votes)
            .map(|entry| entry.candidate_id)
            .collect(),
        _ => Vec::new(),
    };

    Winners {
        position_id: tally.position_id,
        seat_count: tally.seat_count,
        winners: contenders.into_iter().take(seats).cloned().collect(),
        tied_at_cutoff,
    }
}

fn percentage(votes: u64, voters: u64) -> f64 {
    if voters == 0 {
        0.0
    } else {
        votes as f64 / voters as f64 * 100.0
    }
}
