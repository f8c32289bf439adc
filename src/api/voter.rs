use log::info;
use rocket::{
    http::{Cookie, CookieJar},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::Result,
    logging::RequestId,
    model::api::{
        auth::{AuthToken, AUTH_TOKEN_COOKIE},
        ballot::{BallotForm, BallotSpec, Receipt},
        voter::VoterSummary,
    },
    voting::{ballot::BallotLayout, guard::authorize, store::Store, submission::submit},
};

pub fn routes() -> Vec<Route> {
    routes![status, ballot_form, cast_ballot]
}

#[get("/voter/status")]
async fn status(token: AuthToken, store: &State<Store>) -> Result<Json<VoterSummary>> {
    let voter = authorize(store.as_ref(), Some(token.voter_id)).await?;
    Ok(Json(VoterSummary::from(&voter)))
}

#[get("/voter/ballot")]
async fn ballot_form(token: AuthToken, store: &State<Store>) -> Result<Json<BallotForm>> {
    let voter = authorize(store.as_ref(), Some(token.voter_id)).await?;
    let layout = BallotLayout::load(store.as_ref()).await?;
    Ok(Json(layout.form_for(&voter)))
}

#[post("/voter/ballot", data = "<ballot>", format = "json")]
async fn cast_ballot(
    token: AuthToken,
    ballot: Json<BallotSpec>,
    cookies: &CookieJar<'_>,
    store: &State<Store>,
    request_id: &RequestId,
) -> Result<Json<Receipt>> {
    let receipt = submit(store.as_ref(), token.voter_id, &ballot).await?;

    // The session has served its purpose.
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    info!("req{request_id}: receipt issued to voter {}", receipt.voter_id);

    Ok(Json(receipt))
}
