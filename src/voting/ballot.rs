use std::collections::{BTreeMap, BTreeSet};

use crate::error::{BallotError, Result};
use crate::model::{
    api::ballot::{BallotForm, BallotFormCandidate, BallotFormPosition, BallotSpec},
    common::{CandidateId, PositionId, VoterId},
    db::{candidate::Candidate, position::Position, vote::NewVote, voter::Voter},
};

use super::store::BallotStore;

/// An open position together with the candidates that may be voted for under it.
#[derive(Debug, Clone)]
pub struct LayoutPosition {
    pub position: Position,
    pub candidates: Vec<Candidate>,
}

impl LayoutPosition {
    fn has_candidate(&self, candidate: CandidateId) -> bool {
        self.candidates.iter().any(|c| c.id == candidate)
    }
}

/// The shape every ballot is checked against: each open position, its
/// seat-count, and its active candidates.
#[derive(Debug, Clone, Default)]
pub struct BallotLayout {
    positions: BTreeMap<PositionId, LayoutPosition>,
}

impl BallotLayout {
    /// Load the current layout from the store.
    pub async fn load(store: &dyn BallotStore) -> Result<Self> {
        let positions = store.open_positions().await?;
        let ids: Vec<_> = positions.iter().map(|p| p.id).collect();
        let candidates = store.active_candidates(&ids).await?;
        Ok(Self::new(positions, candidates))
    }

    /// Build a layout from open positions and active candidates. Anything
    /// else passed in is ignored.
    pub fn new(positions: Vec<Position>, candidates: Vec<Candidate>) -> Self {
        let mut positions: BTreeMap<_, _> = positions
            .into_iter()
            .filter(|p| p.is_open())
            .map(|position| {
                (
                    position.id,
                    LayoutPosition {
                        position,
                        candidates: Vec::new(),
                    },
                )
            })
            .collect();
        for candidate in candidates.into_iter().filter(|c| c.is_active()) {
            if let Some(entry) = positions.get_mut(&candidate.position_id) {
                entry.candidates.push(candidate);
            }
        }
        for entry in positions.values_mut() {
            entry.candidates.sort_by_key(|c| c.id);
        }
        Self { positions }
    }

    pub fn position_ids(&self) -> impl Iterator<Item = PositionId> + '_ {
        self.positions.keys().copied()
    }

    /// The ballot form shown to the given voter.
    pub fn form_for(&self, voter: &Voter) -> BallotForm {
        BallotForm {
            voter_id: voter.id,
            voter_name: voter.name.clone(),
            positions: self
                .positions
                .values()
                .map(|entry| BallotFormPosition {
                    id: entry.position.id,
                    name: entry.position.name.clone(),
                    seat_count: entry.position.seat_count.get(),
                    candidates: entry
                        .candidates
                        .iter()
                        .map(|c| BallotFormCandidate {
                            id: c.id,
                            name: c.full_name(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// A ballot that has been checked against a [`BallotLayout`]: every position
/// is open, every candidate is active and stands for that position, and no
/// position has more selections than seats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ballot {
    selections: BTreeMap<PositionId, BTreeSet<CandidateId>>,
}

impl Ballot {
    /// Validate a submitted ballot. Positions are checked in ID order, and the
    /// first failure is returned.
    pub fn validate(
        spec: &BallotSpec,
        layout: &BallotLayout,
    ) -> std::result::Result<Self, BallotError> {
        let mut selections = BTreeMap::new();
        for (&position_id, chosen) in &spec.selections {
            let entry = layout
                .positions
                .get(&position_id)
                .ok_or(BallotError::UnknownPosition(position_id))?;

            let chosen: BTreeSet<CandidateId> = chosen.iter().copied().collect();
            if let Some(&candidate) = chosen.iter().find(|&&c| !entry.has_candidate(c)) {
                return Err(BallotError::InvalidCandidate {
                    position: position_id,
                    candidate,
                });
            }
            let seats = entry.position.seats();
            if chosen.len() > seats {
                return Err(BallotError::SelectionLimitExceeded {
                    position: position_id,
                    selected: chosen.len(),
                    seats,
                });
            }

            if !chosen.is_empty() {
                selections.insert(position_id, chosen);
            }
        }
        Ok(Self { selections })
    }

    /// Positions with at least one selection.
    pub fn positions_voted(&self) -> Vec<PositionId> {
        self.selections.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// One vote row per (position, candidate) pair.
    pub fn votes(&self, voter_id: VoterId) -> Vec<NewVote> {
        self.selections
            .iter()
            .flat_map(|(&position_id, candidates)| {
                candidates.iter().map(move |&candidate_id| NewVote {
                    voter_id,
                    candidate_id,
                    position_id,
                })
            })
            .collect()
    }
}
