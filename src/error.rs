use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use log::{error, warn};
use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::{self, status::Custom, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::common::{CandidateId, PositionId, VoterId};

pub type Result<T> = std::result::Result<T, Error>;

/// Why a voter or their ballot was turned away. Every one of these is
/// recoverable by the voter resubmitting a corrected ballot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BallotError {
    #[error("No authenticated voter")]
    NotAuthenticated,
    #[error("Voter {0} is not active")]
    Inactive(VoterId),
    #[error("Voter {0} has already voted")]
    AlreadyVoted(VoterId),
    #[error("Position {0} is not open for voting")]
    UnknownPosition(PositionId),
    #[error("Candidate {candidate} cannot be voted for under position {position}")]
    InvalidCandidate {
        position: PositionId,
        candidate: CandidateId,
    },
    #[error("{selected} candidates selected for position {position}, which elects {seats}")]
    SelectionLimitExceeded {
        position: PositionId,
        selected: usize,
        seats: usize,
    },
}

impl BallotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::Inactive(_) => ErrorKind::Inactive,
            Self::AlreadyVoted(_) => ErrorKind::AlreadyVoted,
            Self::UnknownPosition(_) => ErrorKind::UnknownPosition,
            Self::InvalidCandidate { .. } => ErrorKind::InvalidCandidate,
            Self::SelectionLimitExceeded { .. } => ErrorKind::SelectionLimitExceeded,
        }
    }

    /// The position the voter should be pointed at, if any.
    pub fn position(&self) -> Option<PositionId> {
        match self {
            Self::UnknownPosition(position)
            | Self::InvalidCandidate { position, .. }
            | Self::SelectionLimitExceeded { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// The error kinds reported to clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotAuthenticated,
    Inactive,
    AlreadyVoted,
    UnknownPosition,
    InvalidCandidate,
    SelectionLimitExceeded,
    /// Nothing was committed; retrying the identical request is safe.
    StorageFailure,
    /// Anything else: bad requests, misconfiguration.
    Other,
}

impl ErrorKind {
    pub fn status(self) -> Status {
        match self {
            Self::NotAuthenticated => Status::Unauthorized,
            Self::Inactive => Status::Forbidden,
            Self::AlreadyVoted => Status::Conflict,
            Self::UnknownPosition | Self::InvalidCandidate | Self::SelectionLimitExceeded => {
                Status::UnprocessableEntity
            }
            Self::StorageFailure => Status::ServiceUnavailable,
            Self::Other => Status::InternalServerError,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Ballot(#[from] BallotError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Position {0} is not an open position")]
    PositionNotFound(PositionId),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Ballot(err) => err.kind(),
            Self::PositionNotFound(_) => ErrorKind::UnknownPosition,
            Self::Db(_) | Self::Storage(_) => ErrorKind::StorageFailure,
            Self::Jwt(_) => ErrorKind::NotAuthenticated,
            Self::Argon2(_) | Self::Status(..) => ErrorKind::Other,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Status(status, _) => *status,
            Self::PositionNotFound(_) => Status::NotFound,
            _ => self.kind().status(),
        }
    }

    /// The JSON body describing this error to the client.
    pub fn body(&self) -> ErrorBody {
        let position = match self {
            Self::Ballot(err) => err.position(),
            Self::PositionNotFound(position) => Some(*position),
            _ => None,
        };
        let message = match self.kind() {
            // Driver errors stay in the log.
            ErrorKind::StorageFailure => {
                "The ballot box is temporarily unavailable, please try again".to_string()
            }
            _ => self.to_string(),
        };
        ErrorBody {
            error: self.kind(),
            position,
            message,
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub position: Option<PositionId>,
    pub message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        match status.class() {
            StatusClass::ServerError => error!("{} {}: {self}", req.method(), req.uri()),
            _ => warn!("{} {}: {self}", req.method(), req.uri()),
        }
        Custom(status, Json(self.body())).respond_to(req)
    }
}
