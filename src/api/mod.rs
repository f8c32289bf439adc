use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};

use crate::error::{BallotError, Error, ErrorBody, ErrorKind};

pub mod auth;
pub mod results;
pub mod voter;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(voter::routes());
    routes.extend(results::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, default]
}

/// Requests turned away by the session guard.
#[catch(401)]
fn unauthorized() -> Json<ErrorBody> {
    Json(Error::from(BallotError::NotAuthenticated).body())
}

#[catch(default)]
fn default(status: Status, _req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: ErrorKind::Other,
        position: None,
        message: status.reason_lossy().to_string(),
    })
}
