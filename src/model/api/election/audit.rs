use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    api::receipt::AuditReceipt,
    election::{CandidateId, ElectionId},
};

use super::ElectionDescription;

/// Everything needed to independently check an election's tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// The election, including its claimed results.
    pub election: ElectionDescription,
    /// One receipt per vote cast.
    pub receipts: Vec<AuditReceipt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The claimed results do not cover exactly the election's candidates.
    #[error("Results do not match the candidate list")]
    WrongCandidates,
    /// A receipt belongs to a different election.
    #[error("Receipt {receipt_id} belongs to election {election_id}")]
    WrongElection {
        receipt_id: String,
        election_id: ElectionId,
    },
    /// A receipt names someone who is not standing.
    #[error("Receipt {receipt_id} is for unknown candidate '{candidate}'")]
    UnknownCandidate {
        receipt_id: String,
        candidate: CandidateId,
    },
    /// The same voter appears on more than one receipt.
    #[error("Voter {voter_digest} voted more than once")]
    DuplicateVoter { voter_digest: String },
    /// A candidate's claimed tally disagrees with their receipts.
    #[error("Candidate '{candidate}' claims {claimed} votes but has {counted} receipts")]
    Tally {
        candidate: CandidateId,
        claimed: u64,
        counted: u64,
    },
    /// The claimed total disagrees with the number of receipts.
    #[error("Total claims {claimed} votes but there are {counted} receipts")]
    TotalVotes { claimed: u64, counted: u64 },
}

/// Verified results for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAudit {
    pub candidate_name: CandidateId,
    pub tally: u64,
}

impl AuditReport {
    /// Check the claimed results against the receipts.
    /// On success, returns the verified tally in ballot order.
    pub fn verify(&self) -> Result<Vec<CandidateAudit>, VerificationError> {
        let election = &self.election;

        let candidates: HashSet<&CandidateId> = election.candidates.iter().collect();
        let claimed: HashSet<&CandidateId> = election.results.keys().collect();
        if candidates != claimed || candidates.len() != election.candidates.len() {
            return Err(VerificationError::WrongCandidates);
        }

        let mut counted: HashMap<&CandidateId, u64> = HashMap::new();
        let mut voters = HashSet::new();
        for receipt in self.receipts.iter() {
            if receipt.election_id != election.id {
                return Err(VerificationError::WrongElection {
                    receipt_id: receipt.receipt_id.clone(),
                    election_id: receipt.election_id,
                });
            }
            if !candidates.contains(&receipt.candidate) {
                return Err(VerificationError::UnknownCandidate {
                    receipt_id: receipt.receipt_id.clone(),
                    candidate: receipt.candidate.clone(),
                });
            }
            if !voters.insert(receipt.voter_digest.as_str()) {
                return Err(VerificationError::DuplicateVoter {
                    voter_digest: receipt.voter_digest.clone(),
                });
            }
            *counted.entry(&receipt.candidate).or_default() += 1;
        }

        let mut audits = Vec::with_capacity(election.candidates.len());
        for candidate in election.candidates.iter() {
            let claimed = election.results[candidate];
            let counted = counted.get(candidate).copied().unwrap_or(0);
            if claimed != counted {
                return Err(VerificationError::Tally {
                    candidate: candidate.clone(),
                    claimed,
                    counted,
                });
            }
            audits.push(CandidateAudit {
                candidate_name: candidate.clone(),
                tally: counted,
            });
        }

        let counted = self.receipts.len() as u64;
        if election.total_votes != counted {
            return Err(VerificationError::TotalVotes {
                claimed: election.total_votes,
                counted,
            });
        }

        Ok(audits)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn receipt(voter: &str, candidate: &str) -> AuditReceipt {
        AuditReceipt {
            receipt_id: format!("receipt-{voter}"),
            voter_digest: format!("digest-{voter}"),
            election_id: 1,
            candidate: candidate.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn report() -> AuditReport {
        AuditReport {
            election: ElectionDescription {
                id: 1,
                name: "Student Union President".to_string(),
                candidates: vec!["Alice".to_string(), "Bob".to_string()],
                active: true,
                open: true,
                start_time: Utc::now(),
                end_time: None,
                results: HashMap::from([("Alice".to_string(), 2), ("Bob".to_string(), 1)]),
                total_votes: 3,
            },
            receipts: vec![
                receipt("a", "Alice"),
                receipt("b", "Bob"),
                receipt("c", "Alice"),
            ],
        }
    }

    #[test]
    fn valid_report() {
        let expected = vec![
            CandidateAudit {
                candidate_name: "Alice".to_string(),
                tally: 2,
            },
            CandidateAudit {
                candidate_name: "Bob".to_string(),
                tally: 1,
            },
        ];
        assert_eq!(report().verify(), Ok(expected));
    }

    #[test]
    fn tampered_tally() {
        let mut report = report();
        report.election.results.insert("Bob".to_string(), 2);
        assert_eq!(
            report.verify(),
            Err(VerificationError::Tally {
                candidate: "Bob".to_string(),
                claimed: 2,
                counted: 1,
            })
        );
    }

    #[test]
    fn tampered_total() {
        let mut report = report();
        report.election.total_votes = 4;
        assert_eq!(
            report.verify(),
            Err(VerificationError::TotalVotes {
                claimed: 4,
                counted: 3,
            })
        );
    }

    #[test]
    fn bad_receipts() {
        let mut report = report();
        report.receipts[2].voter_digest = "digest-a".to_string();
        assert_eq!(
            report.verify(),
            Err(VerificationError::DuplicateVoter {
                voter_digest: "digest-a".to_string()
            })
        );

        let mut report = self::report();
        report.receipts[1].candidate = "Mallory".to_string();
        assert_eq!(
            report.verify(),
            Err(VerificationError::UnknownCandidate {
                receipt_id: "receipt-b".to_string(),
                candidate: "Mallory".to_string(),
            })
        );

        let mut report = self::report();
        report.receipts[0].election_id = 2;
        assert_eq!(
            report.verify(),
            Err(VerificationError::WrongElection {
                receipt_id: "receipt-a".to_string(),
                election_id: 2,
            })
        );
    }

    #[test]
    fn wrong_candidates() {
        let mut report = report();
        report.election.results.insert("Carol".to_string(), 0);
        assert_eq!(report.verify(), Err(VerificationError::WrongCandidates));
    }
}
