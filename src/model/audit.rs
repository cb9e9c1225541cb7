use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    election::{CandidateId, ElectionId},
    voter::VoterId,
};

/// Immutable record of one successful vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub voter: VoterId,
    pub election_id: ElectionId,
    pub candidate: CandidateId,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// The entry's unique key. Unique by construction, since each voter votes at most once.
    pub fn key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.voter,
            self.election_id,
            self.timestamp.timestamp_micros()
        )
    }
}

/// The append-only log of every vote cast, grouped by election.
#[derive(Debug, Default)]
pub struct AuditLog {
    by_election: HashMap<ElectionId, Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn append(&mut self, entry: AuditEntry) {
        self.by_election
            .entry(entry.election_id)
            .or_default()
            .push(entry);
    }

    /// All entries for one election, oldest first.
    pub fn for_election(&self, election_id: ElectionId) -> &[AuditEntry] {
        self.by_election
            .get(&election_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
