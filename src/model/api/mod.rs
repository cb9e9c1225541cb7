//! API-compatible types.
//!
//! The types in this module are serialised in the shape the web frontend expects:
//!
//! - Field names are `snake_case`.
//! - Successful responses carry `"success": true` alongside their body.

pub mod election;
pub mod receipt;
pub mod reply;
pub mod voter;
