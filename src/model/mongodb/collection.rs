use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::db::{
    candidate::Candidate,
    position::Position,
    vote::{NewVote, Vote},
    voter::Voter,
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Master data collections, written by the registration office.
impl MongoCollection for Voter {
    const NAME: &'static str = "voters";
}
impl MongoCollection for Position {
    const NAME: &'static str = "positions";
}
impl MongoCollection for Candidate {
    const NAME: &'static str = "candidates";
}

// Vote collections
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}
impl MongoCollection for NewVote {
    const NAME: &'static str = VOTES;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // A voter can select each candidate at most once.
    let unique = IndexOptions::builder().unique(true).build();
    let selection_index = IndexModel::builder()
        .keys(doc! {"voter_id": 1, "candidate_id": 1})
        .options(unique)
        .build();
    Coll::<Vote>::from_db(db)
        .create_index(selection_index, None)
        .await?;

    // Tallies group the votes of one position at a time.
    let tally_index = IndexModel::builder()
        .keys(doc! {"position_id": 1, "candidate_id": 1})
        .build();
    Coll::<Vote>::from_db(db)
        .create_index(tally_index, None)
        .await?;

    // Ballot forms look up the candidates of the open positions.
    let candidate_index = IndexModel::builder()
        .keys(doc! {"position_id": 1, "status": 1})
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    Ok(())
}
