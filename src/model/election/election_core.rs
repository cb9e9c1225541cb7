use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::api::election::ElectionSpec;

use super::{CandidateId, ElectionId};

/// A single election, as held by the [`super::ElectionStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    /// Election unique ID.
    pub id: ElectionId,
    /// Election name.
    pub name: String,
    /// Candidates, in ballot order.
    pub candidates: Vec<CandidateId>,
    /// Only active elections accept votes.
    pub active: bool,
    /// When the election was created.
    pub start_time: DateTime<Utc>,
    /// When the election stops accepting votes, if ever.
    pub end_time: Option<DateTime<Utc>>,
    /// Votes received by each candidate.
    tally: HashMap<CandidateId, u64>,
}

impl Election {
    /// Create a new election with an all-zero tally.
    /// `spec` must already have been validated.
    pub(super) fn new(id: ElectionId, spec: ElectionSpec, start_time: DateTime<Utc>) -> Self {
        let tally = spec
            .candidates
            .iter()
            .map(|candidate| (candidate.clone(), 0))
            .collect();
        let end_time = spec
            .duration
            .map(|secs| start_time + Duration::seconds(i64::from(secs)));

        Self {
            id,
            name: spec.name,
            candidates: spec.candidates,
            active: spec.active,
            start_time,
            end_time,
            tally,
        }
    }

    /// Does this election accept votes at the given time?
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.end_time.map_or(true, |end| now < end)
    }

    /// Is the given candidate standing in this election?
    pub fn has_candidate(&self, candidate: &str) -> bool {
        self.tally.contains_key(candidate)
    }

    /// Current votes per candidate.
    pub fn tally(&self) -> &HashMap<CandidateId, u64> {
        &self.tally
    }

    /// Sum of the tally.
    pub fn total_votes(&self) -> u64 {
        self.tally.values().sum()
    }

    /// Add one vote for the candidate. Returns false if they are not standing.
    pub(super) fn record_vote(&mut self, candidate: &str) -> bool {
        match self.tally.get_mut(candidate) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }
}
