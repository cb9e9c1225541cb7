//! The voter/election state machine.
//!
//! Each voter moves `Unregistered -> Registered -> Voted` and never back. All registry
//! mutations happen under one mutex; `cast_vote` additionally takes the election store's
//! write lock while holding it, always in that order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use log::{error, info};

use crate::error::{Error, Result};
use crate::ledger::{LedgerEvent, LedgerSink};
use crate::model::{
    api::{
        election::{AuditReport, ElectionDescription, ElectionResults, ElectionSpec},
        receipt::AuditReceipt,
        voter::VoterStatus,
    },
    audit::AuditEntry,
    election::{ElectionId, ElectionStore},
    voter::{NidHasher, ReceiptDigester, Registration, Registry},
};

/// Registers voters and records their votes against an [`ElectionStore`].
///
/// Cloning the engine shares the underlying state.
#[derive(Clone)]
pub struct VotingEngine {
    store: ElectionStore,
    registry: Arc<Mutex<Registry>>,
    hasher: NidHasher,
    digester: ReceiptDigester,
    ledger: Arc<dyn LedgerSink>,
}

impl VotingEngine {
    pub fn new(store: ElectionStore, hasher: NidHasher, ledger: Arc<dyn LedgerSink>) -> Self {
        Self {
            store,
            registry: Arc::new(Mutex::new(Registry::default())),
            digester: hasher.receipt_digester(),
            hasher,
            ledger,
        }
    }

    /// The elections this engine votes against.
    pub fn store(&self) -> &ElectionStore {
        &self.store
    }

    /// Create an election and announce it to the ledger.
    pub fn create_election(&self, spec: ElectionSpec) -> Result<ElectionId> {
        let name = spec.name.clone();
        let election_id = self.store.create_election(spec)?;
        self.ledger
            .submit(LedgerEvent::ElectionCreated { election_id, name });
        Ok(election_id)
    }

    /// Register a voter for an election.
    ///
    /// Fails if the identity is already registered for any election, or if another identity
    /// has registered with the same national ID.
    pub fn register(&self, voter: &str, national_id: &str, election_id: ElectionId) -> Result<()> {
        if voter.trim().is_empty() || national_id.trim().is_empty() {
            return Err(Error::invalid_input("Voter address and NID are required"));
        }
        let nid_hash = self.hasher.hash(national_id);

        {
            let mut registry = self.lock()?;
            // Identity uniqueness is reported before the election is looked up.
            if registry.get(voter).is_some() {
                return Err(Error::AlreadyRegistered);
            }
            self.store.get(election_id)?;
            registry.insert(Registration::new(voter.to_string(), nid_hash, election_id))?;
        }

        info!("Voter {voter} registered for election {election_id}");
        self.ledger.submit(LedgerEvent::VoterRegistered {
            voter: voter.to_string(),
            election_id,
        });
        Ok(())
    }

    /// Cast the voter's one and only vote.
    ///
    /// The eligibility checks, the tally increment, the `voted` flag and the audit entry are
    /// applied under the registry lock, so either all of them happen or none do, and of any
    /// number of concurrent calls for one voter exactly one succeeds. The increment is the
    /// last fallible step.
    pub fn cast_vote(&self, voter: &str, election_id: ElectionId, candidate: &str) -> Result<()> {
        if voter.trim().is_empty() || candidate.trim().is_empty() {
            return Err(Error::invalid_input(
                "Voter address and candidate name are required",
            ));
        }

        {
            let mut registry = self.lock()?;
            let pending = registry.begin_vote(voter, election_id)?;
            self.store.increment(election_id, candidate)?;
            pending.record(candidate, Utc::now());
        }

        info!("Vote cast by {voter} in election {election_id}");
        self.ledger.submit(LedgerEvent::VoteCast {
            voter: voter.to_string(),
            election_id,
            candidate: candidate.to_string(),
        });
        Ok(())
    }

    /// Registration and voting status. Unknown voters are simply unregistered.
    pub fn get_status(&self, voter: &str) -> Result<VoterStatus> {
        Ok(self.lock()?.status(voter))
    }

    pub fn get_results(&self, election_id: ElectionId) -> Result<ElectionResults> {
        self.store.get_results(election_id)
    }

    /// Every vote cast in the given election, oldest first.
    pub fn audit_log(&self, election_id: ElectionId) -> Result<Vec<AuditEntry>> {
        let registry = self.lock()?;
        self.store.get(election_id)?;
        Ok(registry.audit().for_election(election_id).to_vec())
    }

    /// A publishable snapshot of an election with one receipt per vote.
    ///
    /// Taken under the registry lock, so the tally and the receipts are always consistent.
    pub fn audit_report(&self, election_id: ElectionId) -> Result<AuditReport> {
        let registry = self.lock()?;
        let election = self.store.get(election_id)?;
        let receipts = registry
            .audit()
            .for_election(election_id)
            .iter()
            .map(|entry| AuditReceipt::new(entry, &self.digester))
            .collect();
        Ok(AuditReport {
            election: ElectionDescription::from(election),
            receipts,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Registry>> {
        self.registry.lock().map_err(poisoned)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> Error {
    error!("Voter registry lock poisoned");
    Error::InternalFault("Voter registry lock poisoned".to_string())
}
