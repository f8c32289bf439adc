use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::results::{PositionResults, PositionTally, Winners},
        common::PositionId,
    },
    voting::{store::Store, tally},
};

pub fn routes() -> Vec<Route> {
    routes![all_results, position_tally, position_winners]
}

#[get("/results")]
async fn all_results(store: &State<Store>) -> Result<Json<Vec<PositionResults>>> {
    Ok(Json(tally::results(store.as_ref()).await?))
}

#[get("/positions/<position_id>/tally")]
async fn position_tally(position_id: PositionId, store: &State<Store>) -> Result<Json<PositionTally>> {
    Ok(Json(tally::tally(store.as_ref(), position_id).await?))
}

#[get("/positions/<position_id>/winners")]
async fn position_winners(position_id: PositionId, store: &State<Store>) -> Result<Json<Winners>> {
    Ok(Json(tally::winners(store.as_ref(), position_id).await?))
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use super::*;
    use crate::error::{ErrorBody, ErrorKind};
    use crate::model::db::vote::VoteCore;
    use crate::voting::store::memory::MemoryStore;

    fn seed(store: &MemoryStore) {
        let vote = |voter_id, position_id, candidate_id| VoteCore {
            voter_id,
            candidate_id,
            position_id,
        };
        store.insert_votes([
            vote(1, 1, 11),
            vote(1, 2, 20),
            vote(1, 2, 21),
            vote(2, 1, 11),
            vote(2, 2, 21),
            vote(3, 1, 10),
        ]);
    }

    #[backend_test]
    async fn results_for_every_open_position(client: Client, store: MemoryStore) {
        seed(&store);

        let response = client.get(uri!(all_results)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        let results: Vec<PositionResults> = response.into_json().await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.tally.position_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(results[0].winners.winners[0].candidate_id, 11);
        let councilors: Vec<_> = results[1]
            .winners
            .winners
            .iter()
            .map(|e| e.candidate_id)
            .collect();
        assert_eq!(councilors, vec![21, 20]);
    }

    #[backend_test]
    async fn tally_of_one_position(client: Client, store: MemoryStore) {
        seed(&store);

        let response = client.get(uri!(position_tally(1))).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        let tally: PositionTally = response.into_json().await.unwrap();
        let counts: Vec<_> = tally.entries.iter().map(|e| (e.candidate_id, e.votes)).collect();
        assert_eq!(counts, vec![(11, 2), (10, 1)]);
        assert_eq!(tally.voters, 3);
    }

    #[backend_test]
    async fn winners_of_one_position(client: Client, store: MemoryStore) {
        seed(&store);

        let response = client.get(uri!(position_winners(2))).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        let winners: Winners = response.into_json().await.unwrap();
        assert_eq!(winners.seat_count, 2);
        assert_eq!(winners.winners.len(), 2);
        assert!(winners.tied_at_cutoff.is_empty());
    }

    #[backend_test]
    async fn closed_positions_are_not_served(client: Client) {
        for uri in [uri!(position_tally(3)), uri!(position_winners(99))] {
            let response = client.get(uri).dispatch().await;
            assert_eq!(Status::NotFound, response.status());
            let body: ErrorBody = response.into_json().await.unwrap();
            assert_eq!(body.error, ErrorKind::UnknownPosition);
        }
    }
}
