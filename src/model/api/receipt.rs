use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    audit::AuditEntry,
    election::{CandidateId, ElectionId},
    voter::ReceiptDigester,
};

/// A public receipt for one audit entry.
/// The voter's identity is replaced by a keyed digest so receipts can be published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReceipt {
    /// Keyed digest of the audit entry key.
    pub receipt_id: String,
    /// Keyed digest of the voter identity.
    pub voter_digest: String,
    /// Election ID.
    pub election_id: ElectionId,
    /// Candidate voted for.
    pub candidate: CandidateId,
    /// When the vote was cast.
    pub timestamp: DateTime<Utc>,
}

impl AuditReceipt {
    pub fn new(entry: &AuditEntry, digester: &ReceiptDigester) -> Self {
        Self {
            receipt_id: digester.digest(&entry.key()),
            voter_digest: digester.digest(&entry.voter),
            election_id: entry.election_id,
            candidate: entry.candidate.clone(),
            timestamp: entry.timestamp,
        }
    }
}
