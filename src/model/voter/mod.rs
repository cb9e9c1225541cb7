pub use registry::{PendingVote, Registry};
pub use voter_core::{NidHash, NidHasher, ReceiptDigester, Registration};

mod registry;
mod voter_core;

/// Our voter identities are opaque strings, typically a wallet address.
pub type VoterId = String;
