//! Error types for Tiger Leads.

use thiserror::Error;

/// A stored or requested value outside the domain vocabulary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown job review status: {0}")]
    UnknownStatus(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),
}
