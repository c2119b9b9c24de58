//! HTTP API server for Tiger Leads.
//!
//! Serves the matched-lead feed, per-user lead actions and admin triggers
//! for the periodic passes.

pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use rate_limit::RateLimiter;
pub use state::{AppState, Repos};
