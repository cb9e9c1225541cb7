use std::fmt::{self, Debug, Formatter};

use chrono::{DateTime, Utc};
use data_encoding::HEXLOWER;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::model::{api::voter::VoterStatus, election::ElectionId};

use super::VoterId;

pub type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded keyed hash of a national ID. The raw ID is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NidHash(String);

#[cfg(test)]
impl NidHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hex-encoded HMAC-SHA256 of `data` under `key`.
fn keyed_digest(key: &[u8], data: &[u8]) -> String {
    let mut hmac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    hmac.update(data);
    HEXLOWER.encode(&hmac.finalize().into_bytes())
}

/// Turns national IDs into [`NidHash`]es using a server-side secret.
#[derive(Clone)]
pub struct NidHasher {
    secret: Vec<u8>,
}

impl NidHasher {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn hash(&self, national_id: &str) -> NidHash {
        NidHash(keyed_digest(&self.secret, national_id.as_bytes()))
    }

    /// A digester for public receipts, keyed with a subkey of this hasher's secret so
    /// receipt digests and national-ID hashes are never comparable.
    pub fn receipt_digester(&self) -> ReceiptDigester {
        ReceiptDigester {
            key: keyed_digest(&self.secret, b"audit receipts").into_bytes(),
        }
    }
}

impl Debug for NidHasher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NidHasher").finish_non_exhaustive()
    }
}

/// Pseudonymises voter identities on published receipts.
///
/// Identities are public, so a plain hash would let anyone link an identity to its
/// receipt. Without the key, digests cannot be recomputed.
#[derive(Clone)]
pub struct ReceiptDigester {
    key: Vec<u8>,
}

impl ReceiptDigester {
    pub fn digest(&self, data: &str) -> String {
        keyed_digest(&self.key, data.as_bytes())
    }
}

impl Debug for ReceiptDigester {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiptDigester").finish_non_exhaustive()
    }
}

/// A voter's registration for one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Voter identity.
    pub voter: VoterId,
    /// Hash of the national ID they registered with.
    pub nid_hash: NidHash,
    /// The only election this voter may vote in.
    pub election_id: ElectionId,
    /// Always true once the registration exists.
    pub registered: bool,
    /// Flips to true exactly once.
    pub voted: bool,
    pub registration_time: DateTime<Utc>,
    pub vote_time: Option<DateTime<Utc>>,
}

impl Registration {
    pub fn new(voter: VoterId, nid_hash: NidHash, election_id: ElectionId) -> Self {
        Self {
            voter,
            nid_hash,
            election_id,
            registered: true,
            voted: false,
            registration_time: Utc::now(),
            vote_time: None,
        }
    }

    /// Record that the vote has been cast.
    pub fn mark_voted(&mut self, at: DateTime<Utc>) {
        self.voted = true;
        self.vote_time = Some(at);
    }

    pub fn status(&self) -> VoterStatus {
        VoterStatus {
            registered: self.registered,
            voted: self.voted,
        }
    }
}
