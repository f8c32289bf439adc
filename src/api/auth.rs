use log::info;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::{BallotError, Result},
    model::api::{
        auth::{AuthToken, VoterCredentials, AUTH_TOKEN_COOKIE},
        voter::VoterSummary,
    },
    voting::{guard::check_eligible, store::Store},
};

pub fn routes() -> Vec<Route> {
    routes![authenticate, logout]
}

#[post("/auth/voter", data = "<credentials>", format = "json")]
pub async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<VoterCredentials>,
    store: &State<Store>,
    config: &State<Config>,
) -> Result<Json<VoterSummary>> {
    let voter = match store.voter(credentials.voter_id).await? {
        Some(voter) if voter.verify_password(&credentials.password)? => voter,
        _ => return Err(BallotError::NotAuthenticated.into()),
    };
    check_eligible(&voter)?;

    cookies.add(AuthToken::new(voter.id).into_cookie(config));
    info!("Voter {} signed in", voter.id);

    Ok(Json(VoterSummary::from(&voter)))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}
