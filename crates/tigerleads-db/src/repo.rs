//! Repository traits and implementations.

pub mod feed;
pub mod job;
pub mod lead_action;
pub mod lifecycle;
pub mod profile;

pub use feed::{FeedRepo, PgFeedRepo};
pub use job::{JobRecord, JobRepo, PgJobRepo};
pub use lead_action::{LeadActionRepo, LeadList, PgLeadActionRepo, UnlockedLead};
pub use lifecycle::{LifecycleRepo, PgLifecycleRepo};
pub use profile::{PgProfileRepo, ProfileRepo};
