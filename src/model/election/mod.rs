pub use election_core::Election;
pub use store::ElectionStore;

mod election_core;
mod store;

/// Our election IDs are integers, starting from 1.
pub type ElectionId = u32;
/// Our candidate IDs (names) are strings.
pub type CandidateId = String;

/// The election that was implicitly assumed by callers that do not name one.
pub const DEFAULT_ELECTION_ID: ElectionId = 1;
