//! Core domain types for the Tiger Leads lead marketplace.
//!
//! This crate contains:
//! - Job and user identifiers
//! - Jobs, their review status and the lifecycle predicates
//! - Contractor/supplier profiles
//! - Lead matching criteria and feed de-duplication
//! - The unlock-cap tally

pub mod cap;
pub mod error;
pub mod id;
pub mod job;
pub mod lifecycle;
pub mod matching;
pub mod profile;

pub use error::Error;
pub use id::{JobId, UserId};
pub use job::{Job, JobReviewStatus};
pub use lifecycle::{CapReport, PassOutcome, PermitStatusAllowList, TransitionReport};
pub use matching::{ExclusionSet, MatchCriteria, MatchExplanation};
pub use profile::{Role, UserProfile};
