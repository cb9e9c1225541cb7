use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::election::{CandidateId, ElectionId, DEFAULT_ELECTION_ID};

fn default_election() -> ElectionId {
    DEFAULT_ELECTION_ID
}

/// Take a required string field, rejecting absent or blank values.
fn required(field: Option<String>, message: &str) -> Result<String> {
    field
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::invalid_input(message))
}

/// A request to register a voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub voter_address: Option<String>,
    pub nid: Option<String>,
    #[serde(default = "default_election")]
    pub election_id: ElectionId,
}

impl RegistrationRequest {
    /// Split into `(voter_address, nid, election_id)`, checking required fields are present.
    pub fn into_parts(self) -> Result<(String, String, ElectionId)> {
        const MESSAGE: &str = "Voter address and NID are required";
        let voter = required(self.voter_address, MESSAGE)?;
        let nid = required(self.nid, MESSAGE)?;
        Ok((voter, nid, self.election_id))
    }
}

/// A request to cast a vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub voter_address: Option<String>,
    #[serde(default = "default_election")]
    pub election_id: ElectionId,
    pub candidate_name: Option<CandidateId>,
}

impl VoteRequest {
    /// Split into `(voter_address, election_id, candidate_name)`, checking required fields are present.
    pub fn into_parts(self) -> Result<(String, ElectionId, CandidateId)> {
        const MESSAGE: &str = "Voter address and candidate name are required";
        let voter = required(self.voter_address, MESSAGE)?;
        let candidate = required(self.candidate_name, MESSAGE)?;
        Ok((voter, self.election_id, candidate))
    }
}

/// A voter's progress through registration and voting.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterStatus {
    pub registered: bool,
    pub voted: bool,
}
