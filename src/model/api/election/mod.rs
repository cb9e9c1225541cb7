mod audit;
mod desc;
mod results;
mod spec;

pub use audit::{AuditReport, CandidateAudit, VerificationError};
pub use desc::ElectionDescription;
pub use results::ElectionResults;
pub use spec::ElectionSpec;
