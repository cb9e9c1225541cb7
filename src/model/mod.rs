pub mod api;
pub mod audit;
pub mod election;
pub mod voter;
