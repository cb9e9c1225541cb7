use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::{
    engine::VotingEngine,
    ledger::{Ledger, LedgerClient},
    model::{election::ElectionStore, voter::NidHasher},
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default)]
    ledger_url: Option<String>,
    #[serde(default)]
    ledger_contract: Option<String>,
    #[serde(default)]
    ledger_account: Option<String>,
    #[serde(default = "default_ledger_timeout")]
    ledger_timeout: u32,
    #[serde(default = "default_demo_election")]
    demo_election: bool,
    // secrets
    nid_secret: String,
}

fn default_ledger_timeout() -> u32 {
    5
}

fn default_demo_election() -> bool {
    true
}

impl Config {
    /// JSON-RPC endpoint of the ledger node, if ledger notifications are enabled.
    pub fn ledger_url(&self) -> Option<&str> {
        self.ledger_url.as_deref()
    }

    /// Address of the voting contract that ledger transactions are sent to.
    /// Required whenever `ledger_url` is set.
    pub fn ledger_contract(&self) -> Option<&str> {
        self.ledger_contract.as_deref()
    }

    /// Account the ledger transactions are sent from.
    pub fn ledger_account(&self) -> Option<&str> {
        self.ledger_account.as_deref()
    }

    /// Timeout for each ledger request.
    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger_timeout.into())
    }

    /// Whether to create the demo election on startup.
    pub fn demo_election(&self) -> bool {
        self.demo_election
    }

    /// Secret key used to hash national IDs.
    pub fn nid_secret(&self) -> &[u8] {
        self.nid_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// A fairing that builds the ledger client from the config and places a
/// [`Ledger`] into managed state. Must be attached after [`ConfigFairing`].
pub struct LedgerFairing;

#[rocket::async_trait]
impl Fairing for LedgerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Ledger",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Copy what we need out of the config.
        let settings = rocket.state::<Config>().map(|config| {
            (
                config.ledger_url().map(str::to_string),
                config.ledger_contract().map(str::to_string),
                config.ledger_account().map(str::to_string),
                config.ledger_timeout(),
            )
        });
        let (url, contract, account, timeout) = match settings {
            Some(settings) => settings,
            None => {
                error!("Ledger fairing attached before config was loaded");
                return Err(rocket);
            }
        };

        // Construct the client.
        let ledger = match (url, contract) {
            (Some(url), Some(contract)) => {
                match LedgerClient::new(url.clone(), contract.clone(), account, timeout) {
                    Ok(client) => {
                        info!("Ledger notifications will be sent to {contract} via {url}");
                        Ledger::connected_to(client)
                    }
                    Err(e) => {
                        error!("Failed to build ledger client: {e}");
                        return Err(rocket);
                    }
                }
            }
            (Some(_), None) => {
                error!("`ledger_url` is set but `ledger_contract` is not");
                return Err(rocket);
            }
            (None, _) => {
                warn!("No `ledger_url` configured, ledger notifications are disabled");
                Ledger::disabled()
            }
        };

        // Manage the state.
        rocket = rocket.manage(ledger);
        Ok(rocket)
    }
}

/// A fairing that creates the election store and voting engine, seeds the
/// demo election if configured, and places both into managed state.
/// Must be attached after [`ConfigFairing`] and [`LedgerFairing`].
pub struct VotingFairing;

#[rocket::async_trait]
impl Fairing for VotingFairing {
    fn info(&self) -> Info {
        Info {
            name: "Voting engine",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Copy what we need out of the existing state.
        let settings = rocket
            .state::<Config>()
            .map(|config| (config.demo_election(), NidHasher::new(config.nid_secret())));
        let ledger = rocket.state::<Ledger>().cloned();
        let (demo_election, hasher, ledger) = match (settings, ledger) {
            (Some((demo_election, hasher)), Some(ledger)) => (demo_election, hasher, ledger),
            _ => {
                error!("Voting fairing attached before config and ledger were loaded");
                return Err(rocket);
            }
        };

        // Construct the store, seeding it if required.
        let store = if demo_election {
            match ElectionStore::with_demo_election() {
                Ok(store) => store,
                Err(e) => {
                    error!("Failed to create demo election: {e}");
                    return Err(rocket);
                }
            }
        } else {
            ElectionStore::new()
        };
        let engine = VotingEngine::new(store, hasher, Arc::new(ledger));
        info!("Voting engine online");

        // Manage the state.
        rocket = rocket.manage(engine.store().clone()).manage(engine);
        Ok(rocket)
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::Figment;

    use super::*;

    fn figment() -> Figment {
        Figment::from(rocket::Config::debug_default()).merge(("nid_secret", "pepper"))
    }

    #[test]
    fn defaults() {
        let config: Config = figment().extract().unwrap();
        assert_eq!(config.ledger_url(), None);
        assert_eq!(config.ledger_contract(), None);
        assert_eq!(config.ledger_account(), None);
        assert_eq!(config.ledger_timeout(), Duration::from_secs(5));
        assert!(config.demo_election());
        assert_eq!(config.nid_secret(), b"pepper");
    }

    #[test]
    fn secret_is_required() {
        let figment = Figment::from(rocket::Config::debug_default());
        assert!(figment.extract::<Config>().is_err());
    }

    #[rocket::async_test]
    async fn fairings_manage_state() {
        let figment = figment()
            .merge(("demo_election", false))
            .merge(("ledger_url", "http://127.0.0.1:7545"))
            .merge(("ledger_contract", "0x5FbDB2315678afecb367f032d93F642f64180aa3"));
        let rocket = crate::configure(rocket::custom(figment))
            .ignite()
            .await
            .unwrap();

        let ledger = rocket.state::<Ledger>().unwrap();
        assert_eq!(ledger.network_url(), Some("http://127.0.0.1:7545"));
        let store = rocket.state::<ElectionStore>().unwrap();
        assert!(store.list().unwrap().is_empty());
        let engine = rocket.state::<VotingEngine>().unwrap();
        engine.create_election(crate::model::api::election::ElectionSpec::example()).unwrap();
        // The managed store and the engine share state.
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn demo_election_by_default() {
        let rocket = crate::configure(rocket::custom(figment()))
            .ignite()
            .await
            .unwrap();
        let store = rocket.state::<ElectionStore>().unwrap();
        assert_eq!(store.get(1).unwrap().name, "Bangladesh General Election 2025");
        assert_eq!(rocket.state::<Ledger>().unwrap().network_url(), None);
    }

    #[rocket::async_test]
    async fn ignition_fails_without_config() {
        let figment = Figment::from(rocket::Config::debug_default());
        assert!(crate::configure(rocket::custom(figment))
            .ignite()
            .await
            .is_err());
    }

    #[rocket::async_test]
    async fn ledger_url_requires_contract() {
        let figment = figment().merge(("ledger_url", "http://127.0.0.1:7545"));
        assert!(crate::configure(rocket::custom(figment))
            .ignite()
            .await
            .is_err());
    }
}
