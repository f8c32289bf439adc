use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{error, info, warn};
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    request::{FromRequest, Outcome},
    Data, Orbit, Request, Response, Rocket,
};

use crate::model::common::VoterId;

/// A unique identifier for a particular request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// Atomically get the next ID, wrapping around on overflow.
    pub fn next() -> RequestId {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r RequestId {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(req.local_cache(RequestId::next))
    }
}

/// The voter whose session cookie a request carried, once the session guard
/// has accepted it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SessionVoter(Option<VoterId>);

impl SessionVoter {
    /// Remember the voter for the rest of the request. Only the first call
    /// per request has any effect.
    pub fn record(req: &Request<'_>, voter_id: VoterId) {
        req.local_cache(|| SessionVoter(Some(voter_id)));
    }

    pub fn of(req: &Request<'_>) -> Option<VoterId> {
        req.local_cache(|| SessionVoter(None)).0
    }
}

/// The log line for a response.
fn response_line(id: RequestId, voter: Option<VoterId>, code: impl Display, route: &str) -> String {
    match voter {
        Some(voter) => format!("<-rsp{id} {code} {route} [voter {voter}]"),
        None => format!("<-rsp{id} {code} {route}"),
    }
}

/// Logs every request and response, tagged with the request's ID and, for
/// signed-in voters, the voter's ID.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let protocol = if rocket.config().tls_enabled() {
            "https"
        } else {
            "http"
        };
        let ip = &rocket.config().address;
        let port = &rocket.config().port;
        info!("Ballot box open on {protocol}://{ip}:{port}");
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let id = req.local_cache(RequestId::next);
        info!("->req{id} {} {}", req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let id = *req.local_cache(RequestId::next);
        let code = res.status();
        let route = match req.route() {
            Some(route) => match route.name {
                Some(ref name) => format!("{name} ({})", route.uri),
                None => route.uri.to_string(),
            },
            None => "UNKNOWN ROUTE".to_string(),
        };
        let log_msg = response_line(id, SessionVoter::of(req), code, &route);
        match code.class() {
            StatusClass::ServerError => error!("{log_msg}"),
            StatusClass::ClientError => warn!("{log_msg}"),
            _ => info!("{log_msg}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, closing the ballot box...");
    }
}

#[cfg(test)]
mod tests {
    use rocket::local::blocking::Client;

    use super::*;

    #[test]
    fn request_ids_increase() {
        let first = RequestId::next();
        let second = RequestId::next();
        assert!(second > first);
        assert_eq!(second.to_string(), second.0.to_string());
    }

    #[test]
    fn session_voter_is_recorded_once() {
        let client = Client::debug_with(vec![]).unwrap();
        let request = client.get("/voter/status");
        assert_eq!(SessionVoter::of(request.inner()), None);

        let request = client.get("/voter/status");
        SessionVoter::record(request.inner(), 4);
        SessionVoter::record(request.inner(), 9);
        assert_eq!(SessionVoter::of(request.inner()), Some(4));
    }

    #[test]
    fn response_lines_name_the_voter() {
        assert_eq!(
            response_line(RequestId(3), Some(12), 200, "status (/voter/status)"),
            "<-rsp3 200 status (/voter/status) [voter 12]"
        );
        assert_eq!(response_line(RequestId(4), None, 404, "UNKNOWN ROUTE"), "<-rsp4 404 UNKNOWN ROUTE");
    }
}
