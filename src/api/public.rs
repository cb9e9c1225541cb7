use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::engine::VotingEngine;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::model::{
    api::{
        election::{AuditReport, ElectionDescription, ElectionResults},
        reply::{HealthReport, LedgerDetails, LedgerInfo, Reply},
    },
    election::{ElectionId, ElectionStore},
};

pub fn routes() -> Vec<Route> {
    routes![
        health,
        blockchain_info,
        election_results,
        elections,
        election,
        election_audit,
    ]
}

#[get("/health")]
async fn health(ledger: &State<Ledger>) -> Json<HealthReport> {
    let latest_block = ledger.latest_block().await;
    Json(HealthReport {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        blockchain_connected: latest_block.is_some(),
        latest_block: latest_block.unwrap_or(0),
    })
}

#[get("/blockchain-info")]
async fn blockchain_info(ledger: &State<Ledger>) -> Json<Reply<LedgerInfo>> {
    let latest_block = ledger.latest_block().await;
    Json(Reply::ok(LedgerInfo {
        info: LedgerDetails {
            connected: latest_block.is_some(),
            latest_block: latest_block.unwrap_or(0),
            network_url: ledger.network_url().map(str::to_string),
        },
    }))
}

/// Results come straight from the store, never from the ledger.
#[get("/election-results/<election_id>")]
async fn election_results(
    election_id: ElectionId,
    store: &State<ElectionStore>,
) -> Result<Json<Reply<ElectionResults>>> {
    let results = store.get_results(election_id)?;
    Ok(Json(Reply::ok(results)))
}

#[get("/elections")]
async fn elections(store: &State<ElectionStore>) -> Result<Json<Vec<ElectionDescription>>> {
    let elections = store
        .list()?
        .iter()
        .map(ElectionDescription::from)
        .collect();
    Ok(Json(elections))
}

#[get("/elections/<election_id>")]
async fn election(
    election_id: ElectionId,
    store: &State<ElectionStore>,
) -> Result<Json<ElectionDescription>> {
    let election = store.get(election_id)?;
    Ok(Json(election.into()))
}

#[get("/elections/<election_id>/audit")]
async fn election_audit(
    election_id: ElectionId,
    engine: &State<VotingEngine>,
) -> Result<Json<AuditReport>> {
    let report = engine.audit_report(election_id)?;
    Ok(Json(report))
}
