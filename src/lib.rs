#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, LedgerFairing, VotingFairing};
use crate::ledger::Ledger;
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod model;

pub use config::Config;
pub use engine::VotingEngine;

/// Build the server from `Rocket.toml` and the environment.
pub fn build() -> Rocket<Build> {
    configure(rocket::build())
}

/// Mount the API on `rocket` and attach the fairings that load the
/// configuration and construct the managed state.
pub fn configure(rocket: Rocket<Build>) -> Rocket<Build> {
    base(rocket)
        .attach(ConfigFairing)
        .attach(LedgerFairing)
        .attach(VotingFairing)
}

/// Build a server around an existing engine, bypassing configuration.
pub fn rocket_for_engine(engine: VotingEngine, ledger: Ledger) -> Rocket<Build> {
    base(rocket::build())
        .manage(engine.store().clone())
        .manage(ledger)
        .manage(engine)
}

fn base(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api", api::routes())
        .register("/", api::catchers())
        .attach(LoggerFairing)
}

/// A fresh engine that drops its ledger events.
#[cfg(test)]
pub(crate) fn test_engine(demo_election: bool) -> VotingEngine {
    use std::sync::Arc;

    use crate::model::{election::ElectionStore, voter::NidHasher};

    let store = if demo_election {
        ElectionStore::with_demo_election().unwrap()
    } else {
        ElectionStore::new()
    };
    VotingEngine::new(store, NidHasher::new("test secret"), Arc::new(Ledger::disabled()))
}
