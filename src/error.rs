use log::{error, warn};
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::{json, Json},
    Request, Response,
};
use thiserror::Error;

use crate::model::election::{CandidateId, ElectionId};

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong in a core operation.
///
/// All variants except [`Error::InternalFault`] are expected outcomes that the caller can act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Voter already registered")]
    AlreadyRegistered,
    #[error("NID already used")]
    DuplicateNationalId,
    #[error("Voter not registered")]
    NotRegistered,
    #[error("Already voted")]
    AlreadyVoted,
    #[error("Voter is registered for election {registered}, not election {requested}")]
    ElectionMismatch {
        registered: ElectionId,
        requested: ElectionId,
    },
    #[error("Election {0} not active")]
    InactiveElection(ElectionId),
    #[error("Invalid candidate '{candidate}' for election {election_id}")]
    InvalidCandidate {
        election_id: ElectionId,
        candidate: CandidateId,
    },
    #[error("Internal fault: {0}")]
    InternalFault(String),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_) => Status::NotFound,
            Self::InternalFault(_) => Status::InternalServerError,
            Self::InvalidInput(_)
            | Self::AlreadyRegistered
            | Self::DuplicateNationalId
            | Self::NotRegistered
            | Self::AlreadyVoted
            | Self::ElectionMismatch { .. }
            | Self::InactiveElection(_)
            | Self::InvalidCandidate { .. } => Status::BadRequest,
        }
    }
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let message = match &self {
            Self::InternalFault(_) => {
                // Details stay in the log; the caller gets an opaque failure.
                error!("{self}");
                "Internal server error".to_string()
            }
            _ => {
                warn!("Rejected request: {self}");
                self.to_string()
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));
        Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}
