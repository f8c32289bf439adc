use std::collections::HashMap;

use log::debug;
use mongodb::{
    bson::{doc, Document},
    options::{Acknowledgment, FindOptions, ReadConcern, TransactionOptions, WriteConcern},
    Client, Database,
};
use rocket::futures::TryStreamExt;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{
    common::{CandidateId, CandidateStatus, PositionId, PositionStatus, VoterId, VoterStatus},
    db::{candidate::Candidate, position::Position, vote::NewVote, voter::Voter},
    mongodb::{errors::is_write_conflict, u32_id_filter, u32_in_filter, Coll},
};

use super::{BallotStore, CommitOutcome, PositionVotes};

/// The production store: master data and votes live in MongoDB, and ballots
/// are committed in multi-document transactions.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
    voters: Coll<Voter>,
    positions: Coll<Position>,
    candidates: Coll<Candidate>,
    votes: Coll<NewVote>,
}

impl MongoStore {
    pub fn new(client: Client, db: &Database) -> Self {
        Self {
            client,
            db: db.clone(),
            voters: Coll::from_db(db),
            positions: Coll::from_db(db),
            candidates: Coll::from_db(db),
            votes: Coll::from_db(db),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn find_positions(&self, filter: Document) -> Result<Vec<Position>> {
        let by_id = FindOptions::builder().sort(doc! {"_id": 1}).build();
        let positions = self
            .positions
            .find(filter, by_id)
            .await?
            .try_collect()
            .await?;
        Ok(positions)
    }
}

/// Output row of the tally aggregation.
#[derive(Deserialize)]
struct CandidateCount {
    #[serde(rename = "_id")]
    candidate_id: CandidateId,
    votes: u64,
}

#[rocket::async_trait]
impl BallotStore for MongoStore {
    async fn voter(&self, id: VoterId) -> Result<Option<Voter>> {
        Ok(self.voters.find_one(u32_id_filter(id), None).await?)
    }

    async fn position(&self, id: PositionId) -> Result<Option<Position>> {
        Ok(self.positions.find_one(u32_id_filter(id), None).await?)
    }

    async fn open_positions(&self) -> Result<Vec<Position>> {
        self.find_positions(doc! {"status": PositionStatus::Open}).await
    }

    async fn all_positions(&self) -> Result<Vec<Position>> {
        self.find_positions(doc! {}).await
    }

    async fn active_candidates(&self, positions: &[PositionId]) -> Result<Vec<Candidate>> {
        let mut filter = u32_in_filter("position_id", positions);
        filter.insert("status", CandidateStatus::Active);
        let by_id = FindOptions::builder().sort(doc! {"_id": 1}).build();
        let candidates = self
            .candidates
            .find(filter, by_id)
            .await?
            .try_collect()
            .await?;
        Ok(candidates)
    }

    async fn commit_ballot(&self, voter: VoterId, votes: &[NewVote]) -> Result<CommitOutcome> {
        // Dropping the session aborts any transaction still in progress, so
        // every early return below leaves nothing behind.
        let mut session = self.client.start_session(None).await?;
        let options = TransactionOptions::builder()
            .read_concern(ReadConcern::snapshot())
            .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
            .build();
        session.start_transaction(options).await?;

        // Claim the voter first: a concurrent commit for the same voter
        // conflicts on this document before either writes any votes.
        let claim = doc! {
            "_id": voter,
            "status": VoterStatus::Active,
            "has_voted": false,
        };
        let mark_voted = doc! {
            "$set": { "has_voted": true },
        };
        let claimed = match self
            .voters
            .update_one_with_session(claim, mark_voted, None, &mut session)
            .await
        {
            Ok(result) => result.modified_count == 1,
            Err(e) if is_write_conflict(&e) => {
                debug!("Commit for voter {voter} lost a write conflict");
                false
            }
            Err(e) => return Err(e.into()),
        };
        if !claimed {
            session.abort_transaction().await?;
            return Ok(CommitOutcome::Unclaimed);
        }

        // An empty ballot still counts as having voted.
        if !votes.is_empty() {
            self.votes
                .insert_many_with_session(votes, None, &mut session)
                .await?;
        }

        session.commit_transaction().await?;
        Ok(CommitOutcome::Committed)
    }

    async fn position_votes(&self, position: PositionId) -> Result<PositionVotes> {
        let pipeline = vec![
            doc! {
                "$match": { "position_id": position },
            },
            doc! {
                "$group": {
                    "_id": "$candidate_id",
                    "votes": { "$sum": 1 },
                },
            },
        ];
        let mut per_candidate = HashMap::new();
        let mut counts = self.votes.aggregate(pipeline, None).await?;
        while let Some(count) = counts.try_next().await? {
            let count: CandidateCount = mongodb::bson::from_document(count)
                .map_err(|e| Error::Storage(e.to_string()))?;
            per_candidate.insert(count.candidate_id, count.votes);
        }

        let voters = self
            .votes
            .distinct("voter_id", doc! {"position_id": position}, None)
            .await?
            .len() as u64;

        Ok(PositionVotes {
            per_candidate,
            voters,
        })
    }
}

#[cfg(all(test, feature = "mongo-tests"))]
mod tests {
    use std::sync::Arc;

    use rocket::tokio;

    use super::*;
    use crate::model::db::vote::VoteCore;
    use crate::model::mongodb::ensure_indexes_exist;

    /// Connect to a fresh, randomly named database on the debug `db_uri`.
    async fn fresh_store() -> (MongoStore, Database) {
        let db_uri = rocket::Config::figment()
            .extract_inner::<String>("db_uri")
            .expect("`db_uri` must be set for MongoDB tests");
        let client = Client::with_uri_str(db_uri).await.unwrap();
        let random: u32 = rand::random();
        let db = client.database(&format!("test{random}"));
        ensure_indexes_exist(&db).await.unwrap();

        Coll::<Voter>::from_db(&db)
            .insert_many(vec![Voter::example(1), Voter::inactive_example(2)], None)
            .await
            .unwrap();
        Coll::<Position>::from_db(&db)
            .insert_many(
                vec![
                    Position::example(1, "Councilor", 2),
                    Position::closed_example(2, "Auditor", 1),
                ],
                None,
            )
            .await
            .unwrap();
        Coll::<Candidate>::from_db(&db)
            .insert_many(
                vec![
                    Candidate::example(10, 1, "Ada Lovelace"),
                    Candidate::example(11, 1, "Grace Hopper"),
                    Candidate::inactive_example(12, 1, "Alan Turing"),
                ],
                None,
            )
            .await
            .unwrap();

        (MongoStore::new(client, &db), db)
    }

    fn vote(voter_id: VoterId, candidate_id: CandidateId) -> NewVote {
        VoteCore {
            voter_id,
            candidate_id,
            position_id: 1,
        }
    }

    #[rocket::async_test]
    async fn commit_is_conditional_on_the_voter() {
        let (store, db) = fresh_store().await;

        let outcome = store
            .commit_ballot(1, &[vote(1, 10), vote(1, 11)])
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::Committed);
        assert!(store.voter(1).await.unwrap().unwrap().has_voted);

        // Second commit is refused and writes nothing.
        let outcome = store.commit_ballot(1, &[vote(1, 10)]).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Unclaimed);

        // Inactive voters cannot be claimed.
        let outcome = store.commit_ballot(2, &[vote(2, 10)]).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Unclaimed);
        assert!(!store.voter(2).await.unwrap().unwrap().has_voted);

        let counts = store.position_votes(1).await.unwrap();
        assert_eq!(counts.voters, 1);
        assert_eq!(counts.per_candidate.get(&10), Some(&1));
        assert_eq!(counts.per_candidate.get(&11), Some(&1));

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn concurrent_commits_claim_once() {
        let (store, db) = fresh_store().await;
        let store = Arc::new(store);

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.commit_ballot(1, &[vote(1, 10)]).await }
        });
        let second = tokio::spawn({
            let store = store.clone();
            async move { store.commit_ballot(1, &[vote(1, 11)]).await }
        });
        let outcomes = [first.await.unwrap(), second.await.unwrap()];
        let committed = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Ok(CommitOutcome::Committed)))
            .count();
        assert_eq!(committed, 1);
        assert_eq!(store.position_votes(1).await.unwrap().voters, 1);

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn master_data_queries() {
        let (store, db) = fresh_store().await;

        let open: Vec<_> = store
            .open_positions()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(open, vec![1]);
        assert_eq!(store.all_positions().await.unwrap().len(), 2);

        let candidates: Vec<_> = store
            .active_candidates(&[1])
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(candidates, vec![10, 11]);

        db.drop(None).await.unwrap();
    }
}
