use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{
    api::voter::VoterStatus,
    audit::{AuditEntry, AuditLog},
    election::ElectionId,
};

use super::{NidHash, Registration, VoterId};

/// Voter registrations plus the audit log of votes they have cast.
///
/// The primary map and the national-ID index are only ever changed together, so
/// `nid_index` always holds exactly one entry per registration.
#[derive(Debug, Default)]
pub struct Registry {
    voters: HashMap<VoterId, Registration>,
    nid_index: HashMap<NidHash, VoterId>,
    audit: AuditLog,
}

impl Registry {
    pub fn get(&self, voter: &str) -> Option<&Registration> {
        self.voters.get(voter)
    }

    pub fn status(&self, voter: &str) -> VoterStatus {
        self.get(voter)
            .map(Registration::status)
            .unwrap_or_default()
    }

    /// Number of registered voters.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Add a registration, unless its identity or national ID is already taken.
    pub fn insert(&mut self, registration: Registration) -> Result<()> {
        if self.voters.contains_key(&registration.voter) {
            return Err(Error::AlreadyRegistered);
        }
        if self.nid_index.contains_key(&registration.nid_hash) {
            return Err(Error::DuplicateNationalId);
        }

        self.nid_index
            .insert(registration.nid_hash.clone(), registration.voter.clone());
        self.voters.insert(registration.voter.clone(), registration);
        Ok(())
    }

    /// Check that the voter may still vote in the given election.
    ///
    /// On success, the returned [`PendingVote`] is the only way to mark the vote as cast.
    /// Dropping it leaves the registry untouched.
    pub fn begin_vote(&mut self, voter: &str, election_id: ElectionId) -> Result<PendingVote<'_>> {
        let registration = self.voters.get_mut(voter).ok_or(Error::NotRegistered)?;
        if registration.voted {
            return Err(Error::AlreadyVoted);
        }
        if registration.election_id != election_id {
            return Err(Error::ElectionMismatch {
                registered: registration.election_id,
                requested: election_id,
            });
        }
        Ok(PendingVote {
            registration,
            audit: &mut self.audit,
        })
    }
}

/// A vote that has passed every registry check but has not been recorded yet.
#[derive(Debug)]
pub struct PendingVote<'a> {
    registration: &'a mut Registration,
    audit: &'a mut AuditLog,
}

impl PendingVote<'_> {
    /// Mark the voter as having voted and append the audit entry.
    pub fn record(self, candidate: &str, at: DateTime<Utc>) {
        self.registration.mark_voted(at);
        self.audit.append(AuditEntry {
            voter: self.registration.voter.clone(),
            election_id: self.registration.election_id,
            candidate: candidate.to_string(),
            timestamp: at,
        });
    }
}
