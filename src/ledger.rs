//! Advisory notifications to an external ledger.
//!
//! Successful registrations and votes are mirrored to an Ethereum-style JSON-RPC node as an
//! external audit trail. The ledger is never consulted to decide whether an operation
//! succeeded, and submission failures are only logged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use data_encoding::HEXLOWER;
use log::{debug, info, warn};
use rocket::serde::json::{json, serde_json, Value};
use rocket::tokio::runtime::Handle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    election::{CandidateId, ElectionId},
    voter::VoterId,
};

/// Events mirrored to the ledger, named after the contract events they correspond to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    ElectionCreated {
        election_id: ElectionId,
        name: String,
    },
    VoterRegistered {
        voter: VoterId,
        election_id: ElectionId,
    },
    VoteCast {
        voter: VoterId,
        election_id: ElectionId,
        candidate: CandidateId,
    },
}

/// Somewhere to send ledger events. Must not block.
pub trait LedgerSink: Send + Sync {
    fn submit(&self, event: LedgerEvent);
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Malformed JSON-RPC response: {0}")]
    Malformed(String),
}

/// A JSON-RPC client for the ledger node.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    url: String,
    contract: String,
    account: Option<String>,
    next_request_id: Arc<AtomicU64>,
}

impl LedgerClient {
    /// A client posting to the node at `url`, addressing events to `contract`.
    pub fn new(
        url: impl Into<String>,
        contract: impl Into<String>,
        account: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            contract: contract.into(),
            account,
            next_request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Latest block number, or `None` if the node cannot be reached.
    pub async fn latest_block(&self) -> Option<u64> {
        match self.call("eth_blockNumber", json!([])).await {
            Ok(result) => match parse_quantity(&result) {
                Some(block) => Some(block),
                None => {
                    warn!("Ledger returned a malformed block number: {result}");
                    None
                }
            },
            Err(e) => {
                debug!("Ledger unreachable: {e}");
                None
            }
        }
    }

    /// Send the event to the contract as transaction data.
    pub async fn send_event(&self, event: &LedgerEvent) -> Result<Value, LedgerError> {
        let tx = transaction_for(event, &self.contract, self.account.as_deref())?;
        let params = json!([tx]);
        self.call("eth_sendTransaction", params).await
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response: Value = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_response(response)
    }
}

impl LedgerSink for LedgerClient {
    fn submit(&self, event: LedgerEvent) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime available, dropping ledger event {event:?}");
                return;
            }
        };
        let client = self.clone();
        handle.spawn(async move {
            match client.send_event(&event).await {
                Ok(tx) => info!("Ledger accepted {event:?} as {tx}"),
                Err(e) => warn!("Ledger submission of {event:?} failed: {e}"),
            }
        });
    }
}

/// The ledger as seen by the rest of the server: either a live client or nothing.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    client: Option<LedgerClient>,
}

impl Ledger {
    pub fn connected_to(client: LedgerClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn network_url(&self) -> Option<&str> {
        self.client.as_ref().map(LedgerClient::url)
    }

    pub async fn latest_block(&self) -> Option<u64> {
        match &self.client {
            Some(client) => client.latest_block().await,
            None => None,
        }
    }
}

impl LedgerSink for Ledger {
    fn submit(&self, event: LedgerEvent) {
        match &self.client {
            Some(client) => client.submit(event),
            None => debug!("Ledger disabled, dropping {event:?}"),
        }
    }
}

/// Build an `eth_sendTransaction` call to `contract` carrying the hex-encoded JSON event.
/// Without a `to` address the node would treat the payload as a contract deployment.
fn transaction_for(
    event: &LedgerEvent,
    contract: &str,
    account: Option<&str>,
) -> Result<Value, LedgerError> {
    let payload =
        serde_json::to_vec(event).map_err(|e| LedgerError::Malformed(e.to_string()))?;
    let mut tx = json!({
        "to": contract,
        "data": format!("0x{}", HEXLOWER.encode(&payload)),
    });
    if let Some(account) = account {
        tx["from"] = json!(account);
    }
    Ok(tx)
}

/// Extract the `result` of a JSON-RPC response, or its `error`.
fn parse_response(mut response: Value) -> Result<Value, LedgerError> {
    if let Some(error) = response.get("error") {
        return Err(LedgerError::Rpc {
            code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    match response.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(LedgerError::Malformed(response.to_string())),
    }
}

/// Parse a hex quantity such as `"0x1b4"`.
fn parse_quantity(value: &Value) -> Option<u64> {
    let hex = value.as_str()?.strip_prefix("0x")?;
    u64::from_str_radix(hex, 16).ok()
}
