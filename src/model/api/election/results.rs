use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::election::{CandidateId, Election};

/// A snapshot of an election's tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    /// Votes per candidate.
    pub results: HashMap<CandidateId, u64>,
    /// Sum of `results`.
    pub total_votes: u64,
}

impl From<&Election> for ElectionResults {
    fn from(election: &Election) -> Self {
        Self {
            results: election.tally().clone(),
            total_votes: election.total_votes(),
        }
    }
}
