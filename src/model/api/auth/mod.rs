mod token;

use serde::{Deserialize, Serialize};

use crate::model::common::VoterId;

pub use token::{AuthToken, AUTH_TOKEN_COOKIE};

/// Credentials a voter signs in with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCredentials {
    pub voter_id: VoterId,
    pub password: String,
}
