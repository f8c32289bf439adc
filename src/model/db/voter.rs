use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::common::{VoterId, VoterStatus};

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    pub name: String,
    pub password_hash: String,
    pub status: VoterStatus,
    /// Set exactly once, by a successful ballot commit. Never cleared.
    pub has_voted: bool,
}

impl VoterCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> Result<bool> {
        Ok(argon2::verify_encoded(&self.password_hash, password.as_ref())?)
    }

    pub fn is_active(&self) -> bool {
        self.status == VoterStatus::Active
    }
}

/// A voter user from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: VoterId,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}


#[cfg(test)]
pub use examples::EXAMPLE_PASSWORD;
