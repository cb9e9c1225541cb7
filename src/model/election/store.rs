use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{error, info};

use crate::error::{Error, Result};
use crate::model::api::election::{ElectionResults, ElectionSpec};

use super::{Election, ElectionId};

/// All elections, indexed by ID.
#[derive(Debug, Default)]
struct Elections {
    by_id: BTreeMap<ElectionId, Election>,
    last_id: ElectionId,
}

/// Shared handle to the set of elections and their tallies.
///
/// Cloning the handle shares the underlying elections. Every tally update takes the write
/// lock, so a reader never observes a partially applied increment.
#[derive(Debug, Clone, Default)]
pub struct ElectionStore {
    inner: Arc<RwLock<Elections>>,
}

impl ElectionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store containing only the demo election, which receives ID 1.
    pub fn with_demo_election() -> Result<Self> {
        let store = Self::new();
        store.create_election(ElectionSpec::demo())?;
        Ok(store)
    }

    /// Create a new election, returning its freshly allocated ID.
    pub fn create_election(&self, spec: ElectionSpec) -> Result<ElectionId> {
        spec.validate()?;

        let mut elections = self.write()?;
        let id = elections.last_id.checked_add(1).ok_or_else(|| {
            Error::InternalFault("Election ID space exhausted".to_string())
        })?;
        let election = Election::new(id, spec, Utc::now());
        info!(
            "Created election {id} '{}' with {} candidates",
            election.name,
            election.candidates.len()
        );
        elections.by_id.insert(id, election);
        elections.last_id = id;
        Ok(id)
    }

    /// Get a snapshot of a single election.
    pub fn get(&self, election_id: ElectionId) -> Result<Election> {
        self.read()?
            .by_id
            .get(&election_id)
            .cloned()
            .ok_or_else(|| not_found(election_id))
    }

    /// Get snapshots of all elections, in ID order.
    pub fn list(&self) -> Result<Vec<Election>> {
        Ok(self.read()?.by_id.values().cloned().collect())
    }

    /// Get a snapshot of an election's tally.
    pub fn get_results(&self, election_id: ElectionId) -> Result<ElectionResults> {
        self.read()?
            .by_id
            .get(&election_id)
            .map(ElectionResults::from)
            .ok_or_else(|| not_found(election_id))
    }

    /// Add one vote for `candidate` in the given election.
    pub fn increment(&self, election_id: ElectionId, candidate: &str) -> Result<()> {
        self.increment_at(election_id, candidate, Utc::now())
    }

    fn increment_at(
        &self,
        election_id: ElectionId,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut elections = self.write()?;
        let election = elections
            .by_id
            .get_mut(&election_id)
            .ok_or_else(|| not_found(election_id))?;

        if !election.is_open_at(now) {
            return Err(Error::InactiveElection(election_id));
        }
        if !election.record_vote(candidate) {
            return Err(Error::InvalidCandidate {
                election_id,
                candidate: candidate.to_string(),
            });
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Elections>> {
        self.inner.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Elections>> {
        self.inner.write().map_err(poisoned)
    }
}

fn not_found(election_id: ElectionId) -> Error {
    Error::not_found(format!("Election with ID '{election_id}'"))
}

fn poisoned<T>(_: PoisonError<T>) -> Error {
    error!("Election store lock poisoned");
    Error::InternalFault("Election store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::Duration;

    use super::*;

    #[test]
    fn demo_election() {
        let store = ElectionStore::with_demo_election().unwrap();
        let election = store.get(1).unwrap();
        assert_eq!(election.name, "Bangladesh General Election 2025");
        assert_eq!(election.candidates.len(), 5);
        assert!(election.has_candidate("Jatiya Party"));
        assert!(election.active);
    }

    #[test]
    fn ids_are_sequential() {
        let store = ElectionStore::new();
        assert_eq!(store.create_election(ElectionSpec::example()).unwrap(), 1);
        assert_eq!(store.create_election(ElectionSpec::demo()).unwrap(), 2);
        assert_eq!(store.create_election(ElectionSpec::example()).unwrap(), 3);

        let ids: Vec<_> = store.list().unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn invalid_spec_allocates_nothing() {
        let store = ElectionStore::new();
        let spec = ElectionSpec {
            candidates: vec![],
            ..ElectionSpec::example()
        };
        assert!(matches!(
            store.create_election(spec),
            Err(Error::InvalidInput(_))
        ));
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.create_election(ElectionSpec::example()).unwrap(), 1);
    }

    #[test]
    fn unknown_election() {
        let store = ElectionStore::new();
        assert!(matches!(store.get(1), Err(Error::NotFound(_))));
        assert!(matches!(store.get_results(1), Err(Error::NotFound(_))));
        assert!(matches!(
            store.increment(1, "Alice"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn increment_and_results() {
        let store = ElectionStore::new();
        let id = store.create_election(ElectionSpec::example()).unwrap();

        store.increment(id, "Alice").unwrap();
        store.increment(id, "Carol").unwrap();
        store.increment(id, "Alice").unwrap();

        let results = store.get_results(id).unwrap();
        assert_eq!(results.results["Alice"], 2);
        assert_eq!(results.results["Bob"], 0);
        assert_eq!(results.results["Carol"], 1);
        assert_eq!(results.total_votes, 3);
    }

    #[test]
    fn rejected_increments_change_nothing() {
        let store = ElectionStore::new();
        let open = store.create_election(ElectionSpec::example()).unwrap();
        let inactive = store
            .create_election(ElectionSpec {
                active: false,
                ..ElectionSpec::example()
            })
            .unwrap();

        assert_eq!(
            store.increment(open, "Mallory"),
            Err(Error::InvalidCandidate {
                election_id: open,
                candidate: "Mallory".to_string(),
            })
        );
        assert_eq!(
            store.increment(inactive, "Alice"),
            Err(Error::InactiveElection(inactive))
        );
        assert_eq!(store.get_results(open).unwrap().total_votes, 0);
        assert_eq!(store.get_results(inactive).unwrap().total_votes, 0);
    }

    #[test]
    fn closed_after_end_time() {
        let store = ElectionStore::new();
        let id = store
            .create_election(ElectionSpec {
                duration: Some(3600),
                ..ElectionSpec::example()
            })
            .unwrap();
        let end_time = store.get(id).unwrap().end_time.unwrap();

        store
            .increment_at(id, "Bob", end_time - Duration::seconds(1))
            .unwrap();
        assert_eq!(
            store.increment_at(id, "Bob", end_time),
            Err(Error::InactiveElection(id))
        );
        assert_eq!(store.get_results(id).unwrap().total_votes, 1);
    }

    #[test]
    fn concurrent_increments() {
        const THREADS: u64 = 8;
        const VOTES: u64 = 250;

        let store = ElectionStore::new();
        let id = store.create_election(ElectionSpec::example()).unwrap();

        thread::scope(|s| {
            for _ in 0..THREADS {
                let store = store.clone();
                s.spawn(move || {
                    for _ in 0..VOTES {
                        store.increment(id, "Bob").unwrap();
                        // Every snapshot must be internally consistent.
                        let results = store.get_results(id).unwrap();
                        assert_eq!(results.results.values().sum::<u64>(), results.total_votes);
                    }
                });
            }
        });

        let results = store.get_results(id).unwrap();
        assert_eq!(results.results["Bob"], THREADS * VOTES);
        assert_eq!(results.total_votes, THREADS * VOTES);
    }
}
