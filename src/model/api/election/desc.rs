use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::election::{CandidateId, Election, ElectionId};

/// An API-friendly election description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDescription {
    /// Election unique ID.
    pub id: ElectionId,
    /// Election name.
    pub name: String,
    /// Candidates, in ballot order.
    pub candidates: Vec<CandidateId>,
    /// Whether the election was created active.
    pub active: bool,
    /// Whether the election accepted votes at the time of the snapshot.
    pub open: bool,
    /// Election start time.
    pub start_time: DateTime<Utc>,
    /// Election end time, if any.
    pub end_time: Option<DateTime<Utc>>,
    /// Votes per candidate.
    pub results: HashMap<CandidateId, u64>,
    /// Sum of `results`.
    pub total_votes: u64,
}

impl From<&Election> for ElectionDescription {
    fn from(election: &Election) -> Self {
        Self {
            id: election.id,
            name: election.name.clone(),
            candidates: election.candidates.clone(),
            active: election.active,
            open: election.is_open_at(Utc::now()),
            start_time: election.start_time,
            end_time: election.end_time,
            results: election.tally().clone(),
            total_votes: election.total_votes(),
        }
    }
}

impl From<Election> for ElectionDescription {
    fn from(election: Election) -> Self {
        Self::from(&election)
    }
}
