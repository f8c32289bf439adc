use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use log::debug;
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{BallotError, Error};
use crate::logging::SessionVoter;
use crate::model::common::VoterId;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// A voter's session. It only identifies the voter; whether they may still
/// vote is decided afresh on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "vid")]
    pub voter_id: VoterId,
}

impl AuthToken {
    pub fn new(voter_id: VoterId) -> Self {
        Self { voter_id }
    }

    #[allow(clippy::missing_panics_doc)]
    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings");

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Deserialize a token from a cookie, rejecting bad signatures and
    /// expired sessions.
    pub fn from_cookie(cookie: &Cookie<'_>, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the session cookie. Requests without a valid
    /// one fail with `401 Unauthorized`.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match req.guard::<&State<Config>>().await {
            Outcome::Success(config) => config,
            _ => {
                return Outcome::Failure((
                    Status::InternalServerError,
                    Error::Status(Status::InternalServerError, "Config not loaded".to_string()),
                ))
            }
        };

        let cookie = match req.cookies().get(AUTH_TOKEN_COOKIE) {
            Some(cookie) => cookie,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    BallotError::NotAuthenticated.into(),
                ))
            }
        };

        match Self::from_cookie(cookie, config) {
            Ok(token) => {
                SessionVoter::record(req, token.voter_id);
                Outcome::Success(token)
            }
            Err(err) => {
                debug!("Rejected session cookie: {err}");
                Outcome::Failure((Status::Unauthorized, err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(auth_ttl: i64) -> Config {
        Config::new(auth_ttl, "test-secret")
    }

    #[test]
    fn cookie_roundtrip() {
        let config = config(600);
        let cookie = AuthToken::new(7).into_cookie(&config);
        assert!(cookie.http_only().unwrap_or(false));
        assert_eq!(
            AuthToken::from_cookie(&cookie, &config).unwrap(),
            AuthToken::new(7)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let cookie = AuthToken::new(7).into_cookie(&config(600));
        let other = Config::new(600, "another-secret");
        assert!(matches!(
            AuthToken::from_cookie(&cookie, &other),
            Err(Error::Jwt(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Well beyond the decoder's default leeway.
        let config = config(-600);
        let cookie = AuthToken::new(7).into_cookie(&config);
        assert!(AuthToken::from_cookie(&cookie, &config).is_err());
    }
}
